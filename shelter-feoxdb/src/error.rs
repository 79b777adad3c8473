use feoxdb::FeoxError;
use thiserror::Error;

/// Errors that can occur when opening a [`FeOxDbStore`](crate::FeOxDbStore).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// An error from the underlying FeOxDB database.
    #[error("FeOxDB error: {0}")]
    FeOxDb(#[from] FeoxError),

    /// An I/O error occurred while accessing the database file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
