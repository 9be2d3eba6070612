//! Connection handler that serves catalog requests.
//!
//! Each accepted connection gets its own [`catalog_store::ItemStore`] opened
//! from the shared [`Catalog`]. Requests are answered in order until the
//! peer closes the connection or an I/O error ends it.

use std::io::{BufRead, BufReader, Write};

use tracing::{debug, warn};

use catalog_protocol::{Envelope, Frame, FrameReader, ProtocolError, write_frame};
use catalog_store::Catalog;

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::router::{ItemQueries, RequestRouter};

/// Connection handler that answers JSONL catalog requests.
#[derive(Debug)]
pub(crate) struct CatalogConnectionHandler {
    catalog: Catalog,
    router: RequestRouter,
}

impl CatalogConnectionHandler {
    pub(crate) fn new(catalog: Catalog, router: RequestRouter) -> Self {
        Self { catalog, router }
    }

    fn serve(&self, stream: ConnectionStream) {
        let peer = stream.peer_label();
        let mut writer = match stream.try_clone() {
            Ok(writer) => writer,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to clone connection stream");
                return;
            }
        };

        let store = match self.catalog.store() {
            Ok(store) => store,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to open store handle");
                if let Err(write_error) = reject(&mut writer, &error) {
                    warn!(
                        target: DISPATCH_TARGET,
                        %peer,
                        error = %write_error,
                        "failed to send store failure to client"
                    );
                }
                return;
            }
        };

        let mut reader = FrameReader::new(BufReader::new(stream));
        match serve_frames(&self.router, &store, &mut reader, &mut writer) {
            Ok(requests) => {
                debug!(target: DISPATCH_TARGET, %peer, requests, "connection closed by peer");
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "connection terminated");
            }
        }

        if let Err(error) = store.close() {
            warn!(target: DISPATCH_TARGET, %peer, %error, "failed to close store handle");
        }
    }
}

impl ConnectionHandler for CatalogConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.serve(stream);
    }
}

/// Tells the client why its connection cannot be served.
fn reject<W, E>(writer: &mut W, error: &E) -> Result<(), ProtocolError>
where
    W: Write + ?Sized,
    E: std::fmt::Display + ?Sized,
{
    write_frame(writer, &Envelope::failure(error.to_string()))
}

/// Answers frames until end of stream, returning how many were served.
fn serve_frames<Q, R, W>(
    router: &RequestRouter,
    store: &Q,
    reader: &mut FrameReader<R>,
    writer: &mut W,
) -> Result<usize, ProtocolError>
where
    Q: ItemQueries + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut served = 0;
    while let Some(frame) = reader.read_frame()? {
        let envelope = match frame {
            Frame::Line(bytes) => router.respond(store, &bytes),
            Frame::Oversized { size, max_size } => {
                let error = ProtocolError::frame_too_large(size, max_size);
                warn!(target: DISPATCH_TARGET, %error, "discarded oversized request");
                Envelope::failure(error.to_string())
            }
        };
        write_frame(writer, &envelope)?;
        served += 1;
    }
    Ok(served)
}
