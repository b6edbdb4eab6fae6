use praise_core::PassSummary;
use thiserror::Error;

use crate::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The presenter went away or the worker was stopped.
    #[error("stopped")]
    Cancelled,
    #[error("unable to refresh search results: {0}")]
    Refresh(DocumentError),
    #[error("{0}")]
    Fatal(DocumentError),
    #[error("secret key not found: {0}")]
    SecretKey(String),
    #[error("sync client setup failed: {0}")]
    SyncSetup(String),
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    PassCompleted(PassSummary),
    /// The pass ended early on a recoverable error; the next one is scheduled.
    PassFailed { reason: String },
    /// A fatal error ended the worker; it will not reschedule itself.
    PassAborted { reason: String },
    Stopped,
}
