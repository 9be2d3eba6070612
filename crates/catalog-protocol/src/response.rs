//! Response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProtocolError;

/// Success or failure wrapper around every response.
///
/// Serialises as `{"success":true,"data":...}` or
/// `{"success":false,"error":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the request was executed.
    pub success: bool,
    /// Payload of a successful request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Message describing why the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Wraps a payload in a success envelope.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Serialises `data` and wraps it in a success envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the payload cannot be represented
    /// as JSON.
    pub fn success_with<T: Serialize>(data: &T) -> Result<Self, ProtocolError> {
        serde_json::to_value(data)
            .map(Self::success)
            .map_err(ProtocolError::Encode)
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Parses a response frame, as the CLI does after sending a request.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the frame is not a response envelope.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(frame).map_err(ProtocolError::from_json_error)
    }

    /// Returns `true` for success envelopes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}
