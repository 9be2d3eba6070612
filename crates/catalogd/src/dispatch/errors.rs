//! Error types for request dispatch failures.

use thiserror::Error;

use catalog_protocol::{Action, ProtocolError};
use catalog_store::StoreError;

/// Errors surfaced while decoding or executing a request.
///
/// The `Display` output of each variant is the message sent back to the
/// client in the failure envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store rejected the query.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The action is known but disabled by configuration.
    #[error("action '{action}' is disabled on this server")]
    Disabled {
        /// Wire name of the refused action.
        action: &'static str,
    },

    /// The query result could not be encoded as JSON.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DispatchError {
    /// Creates a disabled-action error.
    pub fn disabled(action: Action) -> Self {
        Self::Disabled {
            action: action.as_str(),
        }
    }
}
