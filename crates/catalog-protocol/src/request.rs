//! Request decoding.
//!
//! A request line is decoded in two stages. [`RequestEnvelope::parse`] checks
//! the frame is a JSON object with an `action` string and an optional
//! `params` object. [`RequestEnvelope::into_request`] then resolves the action
//! and decodes `params` into the typed record for that action, filling in
//! defaults for absent keys and ignoring unknown ones.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use strum::{EnumString, IntoStaticStr};

use crate::errors::ProtocolError;

/// Raw request as read off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Name of the requested action.
    pub action: String,
    /// Action parameters. Absent means empty.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RequestEnvelope {
    /// Creates an envelope with no parameters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Map::new(),
        }
    }

    /// Adds a parameter, replacing any previous value under the same key.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Parses one frame into an envelope.
    ///
    /// Trailing whitespace is trimmed before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedJson`] when the frame is empty or is
    /// not JSON, and [`ProtocolError::InvalidEnvelope`] when the JSON does not
    /// have the envelope's shape.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = trim_trailing_whitespace(frame);
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty request line"));
        }
        serde_json::from_slice(trimmed).map_err(ProtocolError::from_json_error)
    }

    /// Action name with surrounding whitespace removed.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.trim()
    }

    /// Resolves the action and decodes its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownAction`] for unrecognised actions and
    /// [`ProtocolError::InvalidParams`] when a parameter has the wrong type or
    /// a required parameter is missing or blank.
    pub fn into_request(self) -> Result<CatalogRequest, ProtocolError> {
        let name = self.action();
        let action: Action = name
            .parse()
            .map_err(|_| ProtocolError::unknown_action(name))?;
        let params = self.params;
        let request = match action {
            Action::Stats => CatalogRequest::Stats,
            Action::Cheapest => CatalogRequest::Cheapest(decode_params(action, params)?),
            Action::SearchName => {
                let params: SearchNameParams = decode_params(action, params)?;
                if params.name.trim().is_empty() {
                    return Err(ProtocolError::invalid_params(
                        action.as_str(),
                        "name must not be empty",
                    ));
                }
                CatalogRequest::SearchName(params)
            }
            Action::PriceRange => CatalogRequest::PriceRange(decode_params(action, params)?),
            Action::All => CatalogRequest::All(decode_params(action, params)?),
        };
        Ok(request)
    }
}

fn decode_params<T: DeserializeOwned>(
    action: Action,
    params: Map<String, Value>,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(params))
        .map_err(|error| ProtocolError::invalid_params(action.as_str(), error.to_string()))
}

/// Actions understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Aggregate statistics.
    Stats,
    /// Lowest priced items.
    Cheapest,
    /// Substring search on the display name.
    SearchName,
    /// Inclusive price range.
    PriceRange,
    /// Unfiltered diagnostic scan.
    All,
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A fully decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    /// `stats`
    Stats,
    /// `cheapest`
    Cheapest(CheapestParams),
    /// `search_name`
    SearchName(SearchNameParams),
    /// `price_range`
    PriceRange(PriceRangeParams),
    /// `all`
    All(DumpParams),
}

impl CatalogRequest {
    /// Decodes a request frame in one step.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`RequestEnvelope::parse`] or
    /// [`RequestEnvelope::into_request`].
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        RequestEnvelope::parse(frame)?.into_request()
    }

    /// Action this request was decoded from.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Stats => Action::Stats,
            Self::Cheapest(_) => Action::Cheapest,
            Self::SearchName(_) => Action::SearchName,
            Self::PriceRange(_) => Action::PriceRange,
            Self::All(_) => Action::All,
        }
    }
}

/// Parameters for `cheapest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheapestParams {
    /// Maximum number of items returned.
    pub limit: u32,
}

impl Default for CheapestParams {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

/// Parameters for `search_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchNameParams {
    /// Substring matched against item display names.
    pub name: String,
}

/// Parameters for `price_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRangeParams {
    /// Inclusive lower bound.
    pub min_price: f64,
    /// Inclusive upper bound.
    pub max_price: f64,
}

impl Default for PriceRangeParams {
    fn default() -> Self {
        Self {
            min_price: 0.0,
            max_price: 999_999.0,
        }
    }
}

/// Parameters for `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpParams {
    /// Maximum number of rows returned.
    pub limit: u32,
}

impl Default for DumpParams {
    fn default() -> Self {
        Self { limit: 100 }
    }
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
