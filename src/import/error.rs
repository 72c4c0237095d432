//! Document-level failures that stop an import

use crate::sheet::SourceRow;
use thiserror::Error;

/// A disclosure-policy breach serious enough to refuse the whole document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    /// Person rows are present while the effective scope is public
    #[error("person node under public scope{}", row_summary(.rows))]
    PersonUnderPublicScope { rows: Vec<SourceRow> },
}

fn row_summary(rows: &[SourceRow]) -> String {
    match rows.first() {
        Some(first) => format!(" ({} row(s), first at {})", rows.len(), first),
        None => String::new(),
    }
}

/// Errors that prevent any document from being produced
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("missing required metadata '{field}': {reason}")]
    MissingRequiredMetadata { field: String, reason: String },

    #[error("policy violation: {0}")]
    PolicyViolation(#[source] PolicyViolation),

    #[error("import cancelled")]
    Cancelled,

    #[error("could not obtain file salt: {0}")]
    SaltUnavailable(String),

    #[error("import error: {0}")]
    Internal(String),
}

impl FatalError {
    pub(crate) fn missing_metadata(field: &str, reason: impl Into<String>) -> Self {
        Self::MissingRequiredMetadata {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, FatalError>;
