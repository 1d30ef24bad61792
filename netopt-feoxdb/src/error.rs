use feoxdb::FeoxError;
use thiserror::Error;

/// Errors from opening a [`FeOxDbStore`](crate::FeOxDbStore).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// Opening or reading the database failed.
    #[error("feoxdb: {0}")]
    FeOxDb(#[from] FeoxError),

    /// The stored key generation marker is unreadable.
    #[error("generation marker has {0} bytes, expected 8")]
    CorruptedGeneration(usize),
}
