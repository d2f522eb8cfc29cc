//! Byte-level file access for scene snapshots.

mod file;

pub use file::{DEFAULT_SCRATCH_DIR_NAME, ScratchDir};

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),
    /// The file name points outside the scratch directory.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
