//! Wire types shared by `catalogd` and the `catalog` CLI.
//!
//! Requests and responses travel as newline-delimited JSON objects. A request
//! names an `action` and carries an optional `params` object; every request
//! receives exactly one [`Envelope`] in return. The [`FrameReader`] and
//! [`write_frame`] helpers implement the framing for both directions.

mod errors;
mod framing;
mod request;
mod response;

pub use errors::ProtocolError;
pub use framing::{Frame, FrameReader, MAX_FRAME_BYTES, write_frame};
pub use request::{
    Action, CatalogRequest, CheapestParams, DumpParams, PriceRangeParams, RequestEnvelope,
    SearchNameParams,
};
pub use response::Envelope;
