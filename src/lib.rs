//! OMTS import: tabular supply-chain disclosures to a validated graph
//!
//! Takes the sheets of a human-edited workbook (organizations, facilities,
//! goods, persons, attestations, consignments and the relationships between
//! them) and produces one internally consistent graph document, or a single
//! fatal error explaining why no document could be produced. A flat tiered
//! Supplier List sheet is accepted in place of the multi-sheet layout.
//!
//! # Core Concepts
//!
//! - **Sheets**: loosely typed rows, validated column by column
//! - **Nodes and edges**: typed records joined through one ID namespace
//! - **Same-as**: assertions that merge two rows into one canonical node
//! - **Disclosure scope**: the audience tier that caps what may be disclosed
//!
//! # Example
//!
//! ```
//! use omts_import::{import, FileSalt, ImportOptions, Sheet};
//!
//! let sheets = vec![
//!     Sheet::new("Metadata")
//!         .with_headers(["field", "value"])
//!         .with_values(["snapshot_date", "2026-02-17"]),
//!     Sheet::new("Goods")
//!         .with_headers(["id", "name"])
//!         .with_values(["good-steel-bolts", "M10 Steel Hex Bolts"]),
//! ];
//! let options = ImportOptions::new().with_salt(FileSalt::from_bytes([0; 32]));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let doc = runtime.block_on(import(sheets, options)).unwrap();
//! assert_eq!(doc.nodes().len(), 1);
//! assert!(doc.diagnostics().is_empty());
//! ```

pub mod config;
pub mod graph;
pub mod import;
pub mod sheet;
pub mod validate;

pub use config::{ConfigError, ImportConfig};
pub use graph::{
    DisclosureScope, DocumentMetadata, Edge, EdgeId, EdgeKind, GraphDocument, Identifier,
    IdentifierScheme, Node, NodeId, NodeKind, Sensitivity,
};
pub use import::{
    import, CancellationToken, ConflictPolicy, Diagnostic, DiagnosticKind, DiagnosticsReport,
    FatalError, FileSalt, ImportOptions, ImportPipeline, PipelineError,
};
pub use sheet::{CellValue, InMemoryWorkbook, Row, Sheet, SheetKind, WorkbookFile, WorkbookSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
