//! Workbook sources: where sheets come from before import
//!
//! The importer itself only sees `Vec<Sheet>`. Sources adapt whatever the
//! spreadsheet reader produced into that shape.

use super::table::Sheet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a workbook
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for workbook sources
pub type SourceResult<T> = Result<T, SourceError>;

/// On-disk dump of a workbook: an ordered list of sheets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Something that can hand over a workbook's sheets
#[async_trait]
pub trait WorkbookSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    async fn load_sheets(&self) -> SourceResult<Vec<Sheet>>;
}

/// Sheets already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: Vec<Sheet>,
}

impl InMemoryWorkbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }
}

#[async_trait]
impl WorkbookSource for InMemoryWorkbook {
    fn describe(&self) -> String {
        format!("in-memory workbook ({} sheets)", self.sheets.len())
    }

    async fn load_sheets(&self) -> SourceResult<Vec<Sheet>> {
        Ok(self.sheets.clone())
    }
}

/// A workbook dumped to JSON or YAML (chosen by file extension)
#[derive(Debug, Clone)]
pub struct WorkbookFile {
    path: PathBuf,
}

impl WorkbookFile {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_yaml(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
    }
}

#[async_trait]
impl WorkbookSource for WorkbookFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load_sheets(&self) -> SourceResult<Vec<Sheet>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let workbook: Workbook = if self.is_yaml() {
            serde_yaml::from_str(&raw)?
        } else {
            serde_json::from_str(&raw)?
        };
        Ok(workbook.sheets)
    }
}
