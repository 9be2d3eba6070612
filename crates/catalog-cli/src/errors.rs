//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use catalog_protocol::ProtocolError;
use catalog_store::StoreError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid --param '{0}': expected key=value")]
    InvalidParam(String),
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("failed to send request to daemon: {0}")]
    SendRequest(ProtocolError),
    #[error("failed to read response from daemon: {0}")]
    ReadResponse(io::Error),
    #[error("daemon closed the connection without responding")]
    MissingResponse,
    #[error("daemon response exceeded {max_size} bytes")]
    ResponseTooLarge { max_size: usize },
    #[error("failed to parse daemon response: {0}")]
    ParseResponse(ProtocolError),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    #[error("failed to read page '{path}': {source}")]
    ReadPage { path: Utf8PathBuf, source: io::Error },
    #[error("page '{path}' is not valid JSON: {source}")]
    ParsePage {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
    #[error("page '{path}' is neither an item array nor a Code/Data envelope")]
    UnrecognisedPage { path: Utf8PathBuf },
    #[error("catalog operation failed: {0}")]
    Store(#[from] StoreError),
    #[error("refusing to clear the catalog without --confirm")]
    ClearNotConfirmed,
}
