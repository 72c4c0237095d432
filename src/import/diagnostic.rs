//! Row-level diagnostics
//!
//! Everything here is recoverable: a diagnostic is recorded with its sheet,
//! row and column, and the import carries on. Fatal conditions live in
//! [`super::FatalError`].

use crate::sheet::{SheetKind, SourceRow};
use crate::validate::ValidationFailure;
use serde::Serialize;

/// What went wrong (or what was changed) for a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Cell failed its column type, range or pattern, or a row rule
    InvalidFormat,
    /// Identifier failed its scheme's format or check digit
    InvalidIdentifierFormat { scheme: String },
    /// Reference to a node ID that does not exist
    DanglingReference,
    /// Reference resolves to a node of the wrong kind
    TypeMismatch,
    /// Two merged nodes held different explicit values for one field
    MergeConflict,
    /// A user-supplied ID was already taken by an earlier row
    DuplicateId,
    /// A person node's stated sensitivity was raised to confidential
    SensitivityRaised,
    /// A node above the disclosure scope was replaced by a boundary reference
    BoundaryReplaced,
    /// An identifier above the disclosure scope was left out
    IdentifierWithheld,
}

/// How a diagnostic should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input was rejected or altered because it was wrong
    Error,
    /// Input was valid but the importer changed or dropped it
    Warning,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MergeConflict
            | Self::SensitivityRaised
            | Self::BoundaryReplaced
            | Self::IdentifierWithheld => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "InvalidFormat",
            Self::InvalidIdentifierFormat { .. } => "InvalidIdentifierFormat",
            Self::DanglingReference => "DanglingReference",
            Self::TypeMismatch => "TypeMismatch",
            Self::MergeConflict => "MergeConflict",
            Self::DuplicateId => "DuplicateId",
            Self::SensitivityRaised => "SensitivityRaised",
            Self::BoundaryReplaced => "BoundaryReplaced",
            Self::IdentifierWithheld => "IdentifierWithheld",
        }
    }
}

/// One recorded problem, located by sheet, row and column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub sheet: SheetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, origin: SourceRow, message: impl Into<String>) -> Self {
        Self {
            kind,
            sheet: origin.sheet,
            row: Some(origin.row),
            column: None,
            message: message.into(),
        }
    }

    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn from_validation(origin: SourceRow, failure: &ValidationFailure) -> Self {
        let kind = match failure {
            ValidationFailure::InvalidIdentifierFormat { scheme, .. } => {
                DiagnosticKind::InvalidIdentifierFormat {
                    scheme: scheme.clone(),
                }
            }
            _ => DiagnosticKind::InvalidFormat,
        };
        Self::new(kind, origin, failure.to_string()).in_column(failure.column())
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    fn sort_key(&self) -> (SheetKind, usize) {
        (self.sheet, self.row.unwrap_or(0))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.sheet)?;
        if let Some(row) = self.row {
            write!(f, " row {}", row)?;
        }
        if let Some(column) = &self.column {
            write!(f, " ({})", column)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// All diagnostics from one import, ordered by sheet then row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticsReport {
    entries: Vec<Diagnostic>,
}

impl DiagnosticsReport {
    pub(crate) fn from_unsorted(mut entries: Vec<Diagnostic>) -> Self {
        entries.sort_by_key(Diagnostic::sort_key);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics whose kind matches `pred`
    pub fn matching<'a>(
        &'a self,
        pred: impl Fn(&DiagnosticKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| pred(&d.kind))
    }

    /// Diagnostics reported against one sheet row
    pub fn for_row(&self, sheet: SheetKind, row: usize) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(move |d| d.sheet == sheet && d.row == Some(row))
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.len() - self.error_count()
    }
}

impl<'a> IntoIterator for &'a DiagnosticsReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
