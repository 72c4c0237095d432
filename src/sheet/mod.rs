//! Tabular input: sheets, rows, cells, the recognised sheet layouts and
//! the sources that supply them

mod schema;
mod source;
mod table;

pub use schema::SheetKind;
pub use source::{InMemoryWorkbook, SourceError, SourceResult, Workbook, WorkbookFile, WorkbookSource};
pub use table::{CellValue, Row, Sheet, SourceRow};
