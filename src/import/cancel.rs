//! Cooperative cancellation for imports
//!
//! The caller holds a clone of the token and may cancel at any time. The
//! pipeline checks it between stages; a stage already running finishes.

use super::error::{FatalError, ImportResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation token.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Stage boundary: fail with [`FatalError::Cancelled`] if cancelled.
    pub(crate) fn checkpoint(&self, stage: &str) -> ImportResult<()> {
        if self.is_cancelled() {
            tracing::info!(stage, "import cancelled");
            return Err(FatalError::Cancelled);
        }
        Ok(())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
