//! JSONL request dispatch for catalog queries.
//!
//! Clients send one request object per line:
//!
//! ```json
//! {"action":"cheapest","params":{"limit":5}}
//! ```
//!
//! and receive exactly one envelope per request:
//!
//! ```json
//! {"success":true,"data":[...]}
//! {"success":false,"error":"unknown action: bogus"}
//! ```
//!
//! Decode failures, parameter errors and store failures all become failure
//! envelopes. The connection stays open until the peer closes it.

mod errors;
mod handler;
mod router;

pub(crate) use self::handler::CatalogConnectionHandler;
pub(crate) use self::router::RequestRouter;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
