//! Options for one import run

use super::cancel::CancellationToken;
use super::error::{FatalError, ImportResult};
use super::ids::FileSalt;
use super::merge::ConflictPolicy;
use crate::graph::DisclosureScope;

/// Where the file salt comes from
#[derive(Debug, Clone, Default)]
pub enum SaltSource {
    /// Fresh random salt for every import
    #[default]
    Random,
    /// Fixed salt, for reproducible IDs
    Fixed(FileSalt),
}

impl SaltSource {
    pub fn resolve(&self) -> ImportResult<FileSalt> {
        match self {
            Self::Random => {
                FileSalt::generate().map_err(|e| FatalError::SaltUnavailable(e.to_string()))
            }
            Self::Fixed(salt) => Ok(salt.clone()),
        }
    }
}

/// Options for [`import`](super::import)
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub salt: SaltSource,
    /// Validate under this scope if it is stricter than the workbook's own
    pub scope_override: Option<DisclosureScope>,
    pub conflict_policy: ConflictPolicy,
    /// Upper bound on sheets parsed at once
    pub max_parallel_sheets: usize,
    pub cancellation: CancellationToken,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            salt: SaltSource::Random,
            scope_override: None,
            conflict_policy: ConflictPolicy::default(),
            max_parallel_sheets: 4,
            cancellation: CancellationToken::new(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(mut self, salt: FileSalt) -> Self {
        self.salt = SaltSource::Fixed(salt);
        self
    }

    pub fn with_scope_override(mut self, scope: DisclosureScope) -> Self {
        self.scope_override = Some(scope);
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_max_parallel_sheets(mut self, limit: usize) -> Self {
        self.max_parallel_sheets = limit.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}
