//! In-memory tables handed over by the spreadsheet reader

use super::schema::SheetKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw cell content as the spreadsheet reader saw it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Blank,
    Bool(bool),
    Number(f64),
    Text(String),
}

static BLANK: CellValue = CellValue::Blank;

impl CellValue {
    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell, or `None` when blank.
    ///
    /// Whole numbers render without a fractional part, so a numeric cell
    /// holding `51.0` reads as `"51"`.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Blank => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(n) => Some(render_number(*n)),
            Self::Bool(true) => Some("TRUE".to_string()),
            Self::Bool(false) => Some("FALSE".to_string()),
        }
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Some(s) => f.write_str(&s),
            None => f.write_str("<blank>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One data row: column name to cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// Cell under `column`. Column names match case-insensitively; a
    /// missing column reads as blank.
    pub fn get(&self, column: &str) -> &CellValue {
        if let Some(cell) = self.cells.get(column) {
            return cell;
        }
        self.cells
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(column))
            .map(|(_, cell)| cell)
            .unwrap_or(&BLANK)
    }

    /// True when every cell is blank
    pub fn is_empty(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

/// Header row of a sheet that opens with a preamble: two label/value rows,
/// then a blank row.
const HEADER_ROW_AFTER_PREAMBLE: usize = 4;

/// A named sheet: header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Label/value cells above the header row, keyed by label
    #[serde(default, skip_serializing_if = "Row::is_empty")]
    pub preamble: Row,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preamble: Row::new(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_preamble(mut self, label: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.preamble = self.preamble.with_cell(label, value);
        self
    }

    /// Preamble value under `key`; labels match ignoring case, with spaces
    /// and underscores treated alike.
    pub fn preamble_value(&self, key: &str) -> &CellValue {
        self.preamble
            .cells
            .iter()
            .find(|(label, _)| label.trim().replace(' ', "_").eq_ignore_ascii_case(key))
            .map(|(_, cell)| cell)
            .unwrap_or(&BLANK)
    }

    /// Spreadsheet row holding the column headers
    pub fn header_row(&self) -> usize {
        if self.preamble.is_empty() {
            1
        } else {
            HEADER_ROW_AFTER_PREAMBLE
        }
    }

    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Append a row given positionally, matching cells to the header row.
    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let row = self
            .headers
            .iter()
            .zip(values)
            .fold(Row::new(), |row, (header, value)| row.with_cell(header.clone(), value));
        self.rows.push(row);
        self
    }

    /// Recognised kind of this sheet, if any
    pub fn kind(&self) -> Option<SheetKind> {
        SheetKind::from_name(&self.name)
    }

    /// Non-empty data rows with their spreadsheet row numbers.
    ///
    /// Data starts on the row after [`Sheet::header_row`]; for a plain sheet
    /// that is row 2. Blank rows are skipped but still count towards
    /// numbering.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        let first = self.header_row() + 1;
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_empty())
            .map(move |(i, row)| (i + first, row))
    }

    /// Key and value column names for a two-column key/value sheet.
    pub fn key_value_columns(&self) -> (&str, &str) {
        let key = self.headers.first().map(String::as_str).unwrap_or("field");
        let value = self.headers.get(1).map(String::as_str).unwrap_or("value");
        (key, value)
    }
}

/// Sheet and spreadsheet row a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRow {
    pub sheet: SheetKind,
    pub row: usize,
}

impl SourceRow {
    pub fn new(sheet: SheetKind, row: usize) -> Self {
        Self { sheet, row }
    }
}

impl std::fmt::Display for SourceRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} row {}", self.sheet, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(51.0).render().as_deref(), Some("51"));
        assert_eq!(CellValue::Number(53.3811).render().as_deref(), Some("53.3811"));
    }

    #[test]
    fn whitespace_text_is_blank() {
        assert!(CellValue::from("   ").is_blank());
        assert_eq!(CellValue::from("  x ").render().as_deref(), Some("x"));
    }

    #[test]
    fn column_lookup_ignores_case() {
        let row = Row::new().with_cell("Name", "Acme");
        assert_eq!(row.get("name").render().as_deref(), Some("Acme"));
        assert!(row.get("missing").is_blank());
    }

    #[test]
    fn data_rows_skip_blank_rows_but_keep_numbering() {
        let sheet = Sheet::new("Goods")
            .with_headers(["id", "name"])
            .with_values(["g1", "Bolts"])
            .with_values(["", ""])
            .with_values(["g2", "Nuts"]);

        let numbers: Vec<usize> = sheet.data_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 4]);
    }

    #[test]
    fn preamble_pushes_data_rows_down() {
        let sheet = Sheet::new("Supplier List")
            .with_preamble("Reporting Entity", "Acme Manufacturing")
            .with_preamble("Snapshot Date", "2026-02-17")
            .with_headers(["supplier_name"])
            .with_values(["Bolt Supplies Ltd"]);

        assert_eq!(sheet.header_row(), 4);
        assert_eq!(sheet.data_rows().next().map(|(n, _)| n), Some(5));
        assert_eq!(
            sheet.preamble_value("snapshot_date").render().as_deref(),
            Some("2026-02-17")
        );
        assert!(sheet.preamble_value("disclosure_scope").is_blank());
    }

    #[test]
    fn cells_deserialize_untagged() {
        let row: Row =
            serde_json::from_str(r#"{"name": "Acme", "percentage": 51, "direct": true, "x": null}"#)
                .unwrap();
        assert_eq!(row.get("name"), &CellValue::Text("Acme".into()));
        assert_eq!(row.get("percentage"), &CellValue::Number(51.0));
        assert_eq!(row.get("direct"), &CellValue::Bool(true));
        assert!(row.get("x").is_blank());
    }
}
