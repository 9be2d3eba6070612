//! Errors raised while decoding requests or writing frames.

use std::io;

use thiserror::Error;

/// Errors surfaced while decoding a request frame or encoding a response.
///
/// The display form of every decode variant is the message placed in the
/// failure envelope returned to the client.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is empty or is not valid JSON.
    #[error("malformed request: {message}")]
    MalformedJson {
        /// Human-readable parse failure.
        message: String,
        /// Underlying parser error, absent for empty frames.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Frame is valid JSON but does not match the request envelope.
    #[error("malformed request: {message}")]
    InvalidEnvelope {
        /// Description of the structural mismatch.
        message: String,
    },

    /// Action name is not recognised.
    #[error("unknown action: {action}")]
    UnknownAction {
        /// Action exactly as the client sent it (trimmed).
        action: String,
    },

    /// Parameters do not fit the action's parameter record.
    #[error("invalid parameters for '{action}': {message}")]
    InvalidParams {
        /// Action whose parameters were rejected.
        action: String,
        /// Reason the parameters were rejected.
        message: String,
    },

    /// Frame exceeded the maximum permitted size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    FrameTooLarge {
        /// Bytes received before the delimiter.
        size: usize,
        /// Configured frame limit.
        max_size: usize,
    },

    /// Response could not be serialised.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// IO error while writing a frame.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Classifies a `serde_json` failure on a request frame.
    ///
    /// Syntax and EOF errors mean the frame was not JSON; data errors mean it
    /// was JSON of the wrong shape.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        if source.is_data() {
            Self::InvalidEnvelope {
                message: source.to_string(),
            }
        } else {
            Self::MalformedJson {
                message: source.to_string(),
                source: Some(source),
            }
        }
    }

    /// Creates a malformed request error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJson {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown action error.
    #[must_use]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates an invalid parameters error.
    #[must_use]
    pub fn invalid_params(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a frame too large error.
    #[must_use]
    pub fn frame_too_large(size: usize, max_size: usize) -> Self {
        Self::FrameTooLarge { size, max_size }
    }
}
