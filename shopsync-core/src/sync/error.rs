//! Sync error types.

use thiserror::Error;

use crate::models::ValidationError;
use crate::service::RemoteError;

/// Errors surfaced by the sync engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Rejected locally, nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("No list is loaded")]
    NoList,

    #[error("The list was deleted")]
    ListDeleted,
}

impl SyncError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Remote(e) if e.is_unauthorized())
    }
}
