//! Newline-delimited JSON framing.
//!
//! One frame is one line. The reader enforces a size limit without buffering
//! oversized lines: once a line passes the limit its remaining bytes are
//! skipped up to the delimiter, and the caller is told how large it was so
//! it can answer with an error and keep the stream in sync.

use std::io::{self, BufRead, Write};

use serde::Serialize;

use crate::errors::ProtocolError;

/// Largest frame accepted by [`FrameReader::new`], delimiter included.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Outcome of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line without its trailing `\n`.
    Line(Vec<u8>),
    /// A line longer than the limit. Its bytes were discarded.
    Oversized {
        /// Bytes consumed for the line, delimiter included.
        size: usize,
        /// Limit in force when the line was read.
        max_size: usize,
    },
}

/// Reads frames from a buffered byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    max_bytes: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps `reader` with the default [`MAX_FRAME_BYTES`] limit.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_FRAME_BYTES)
    }

    /// Wraps `reader` with a custom frame limit.
    #[must_use]
    pub fn with_limit(reader: R, max_bytes: usize) -> Self {
        Self { reader, max_bytes }
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` at end of stream when no bytes are pending. A
    /// partial line at end of stream is returned as a final frame.
    ///
    /// # Errors
    ///
    /// Returns any IO error other than `Interrupted` raised by the reader.
    pub fn read_frame(&mut self) -> io::Result<Option<Frame>> {
        let mut line = Vec::new();
        let mut size = 0_usize;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            };

            if available.is_empty() {
                if size == 0 {
                    return Ok(None);
                }
                return Ok(Some(self.finish(line, size)));
            }

            let (take, complete) = match available.iter().position(|byte| *byte == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            size = size.saturating_add(take);
            if size <= self.max_bytes {
                line.extend_from_slice(available.get(..take).unwrap_or_default());
            } else if !line.is_empty() {
                line = Vec::new();
            }
            self.reader.consume(take);

            if complete {
                return Ok(Some(self.finish(line, size)));
            }
        }
    }

    /// Returns the wrapped reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Mutable access to the wrapped reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    fn finish(&self, mut line: Vec<u8>, size: usize) -> Frame {
        if size > self.max_bytes {
            return Frame::Oversized {
                size,
                max_size: self.max_bytes,
            };
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Frame::Line(line)
    }
}

/// Serialises `message` as one JSON line and flushes the writer.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] when serialisation fails and
/// [`ProtocolError::Io`] when writing fails.
pub fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    let mut encoded = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
    encoded.push(b'\n');
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}
