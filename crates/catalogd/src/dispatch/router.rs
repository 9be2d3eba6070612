//! Action routing for decoded catalog requests.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use catalog_protocol::{CatalogRequest, Envelope};
use catalog_store::{CatalogStats, Item, ItemStore, StoreError};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;

/// Read queries the router needs from a store handle.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait ItemQueries {
    fn stats(&self) -> Result<CatalogStats, StoreError>;
    fn cheapest(&self, limit: u32) -> Result<Vec<Item>, StoreError>;
    fn query_by_name(&self, name: &str) -> Result<Vec<Item>, StoreError>;
    fn query_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Item>, StoreError>;
    fn dump(&self, limit: u32) -> Result<Vec<Item>, StoreError>;
}

impl ItemQueries for ItemStore {
    fn stats(&self) -> Result<CatalogStats, StoreError> {
        Self::stats(self)
    }

    fn cheapest(&self, limit: u32) -> Result<Vec<Item>, StoreError> {
        Self::cheapest(self, limit)
    }

    fn query_by_name(&self, name: &str) -> Result<Vec<Item>, StoreError> {
        Self::query_by_name(self, name)
    }

    fn query_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Item>, StoreError> {
        Self::query_by_price_range(self, min, max)
    }

    fn dump(&self, limit: u32) -> Result<Vec<Item>, StoreError> {
        Self::dump(self, limit)
    }
}

/// Maps requests onto store queries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestRouter {
    allow_dump: bool,
}

impl RequestRouter {
    pub(crate) fn new(allow_dump: bool) -> Self {
        Self { allow_dump }
    }

    /// Decodes `frame`, runs it and wraps the outcome in an envelope.
    ///
    /// Never fails: every error is logged and rendered as a failure envelope.
    pub(crate) fn respond<Q>(&self, store: &Q, frame: &[u8]) -> Envelope
    where
        Q: ItemQueries + ?Sized,
    {
        let outcome = CatalogRequest::decode(frame)
            .map_err(DispatchError::from)
            .and_then(|request| self.route(store, &request));
        match outcome {
            Ok(data) => Envelope::success(data),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "request failed");
                Envelope::failure(error.to_string())
            }
        }
    }

    pub(crate) fn route<Q>(&self, store: &Q, request: &CatalogRequest) -> Result<Value, DispatchError>
    where
        Q: ItemQueries + ?Sized,
    {
        debug!(
            target: DISPATCH_TARGET,
            action = request.action().as_str(),
            "dispatching request"
        );
        match request {
            CatalogRequest::Stats => encode(&store.stats()?),
            CatalogRequest::Cheapest(params) => encode(&store.cheapest(params.limit)?),
            CatalogRequest::SearchName(params) => encode(&store.query_by_name(&params.name)?),
            CatalogRequest::PriceRange(params) => encode(
                &store.query_by_price_range(params.min_price, params.max_price)?,
            ),
            CatalogRequest::All(params) => {
                if !self.allow_dump {
                    return Err(DispatchError::disabled(request.action()));
                }
                encode(&store.dump(params.limit)?)
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(data: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(data).map_err(DispatchError::Encode)
}
