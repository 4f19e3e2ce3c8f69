use common::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unit is not a valid product record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
    #[error("Storage failed: {0}")]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Only storage failures are worth another attempt, a malformed unit
    /// stays malformed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Work queue is closed")]
    Closed,
}
