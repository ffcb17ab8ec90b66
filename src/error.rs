//! Error types for lookup index operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The counters record exists but could not be read or parsed.
    /// The whole incremental cache is unusable when this happens.
    #[error("Failed to read lookup counters from {}: {source}", path.display())]
    Counters {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every file id has been handed out
    #[error("File id space exhausted at size {size}")]
    IdSpaceExhausted { size: crate::lookup::FileId },

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Key or value bytes that do not decode
    #[error("Encoding error: {0}")]
    Codec(#[from] bitcode::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl IndexError {
    /// Wrap a counters failure, keeping the original cause attached.
    pub(crate) fn counters(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Counters {
            path: path.into(),
            source,
        }
    }
}
