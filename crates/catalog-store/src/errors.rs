use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by the catalog and its store handles.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database directory could not be created.
    #[error("failed to create database directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The database file could not be opened or configured.
    #[error("failed to open database '{path}': {source}")]
    Open {
        /// Database file.
        path: Utf8PathBuf,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed.
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A record without an `id` was offered for writing.
    #[error("item record has no id")]
    MissingId,
    /// A writer panicked while holding the write gate.
    #[error("write gate poisoned by a panicked writer")]
    WriteGatePoisoned,
    /// Closing the connection failed.
    #[error("failed to close database connection: {0}")]
    Close(#[source] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn open(path: impl Into<Utf8PathBuf>, source: rusqlite::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
