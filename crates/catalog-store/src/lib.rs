//! SQLite-backed item catalog.
//!
//! A [`Catalog`] owns the database location and the write gate shared by every
//! handle opened from it. Each [`ItemStore`] wraps one SQLite connection and
//! is meant to be owned by a single worker; handles opened from the same
//! catalog serialise their writes through the gate while reads proceed
//! concurrently under WAL journaling.

mod catalog;
mod errors;
mod item;
mod record;
mod schema;
mod store;

pub use catalog::{Catalog, CatalogOptions};
pub use errors::StoreError;
pub use item::{CatalogStats, Item, UpsertOutcome, UpsertSummary};
pub use record::{ItemRecord, to_float};
pub use store::ItemStore;

/// Tracing target for store events.
pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");
