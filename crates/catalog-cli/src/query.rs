//! `catalog query`: one request, one response.

use std::io::{BufRead, BufReader, Write};
use std::process::ExitCode;

use serde_json::Value;

use catalog_config::Config;
use catalog_protocol::{Envelope, Frame, FrameReader, RequestEnvelope, write_frame};

use crate::AppError;
use crate::transport::connect;

/// Largest response line the CLI accepts. Responses to `all` can be far
/// larger than a request.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Builds the request envelope from the action and its `key=value` pairs.
pub(crate) fn build_request(action: &str, params: &[String]) -> Result<RequestEnvelope, AppError> {
    params
        .iter()
        .try_fold(RequestEnvelope::new(action), |request, raw| {
            let (key, value) = parse_param(raw)?;
            Ok(request.with_param(key, value))
        })
}

fn parse_param(raw: &str) -> Result<(String, Value), AppError> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| AppError::InvalidParam(raw.to_owned()))?;
    Ok((key.trim().to_owned(), parse_value(value)))
}

/// Reads `value` as a JSON scalar when it is one, otherwise as a string.
fn parse_value(value: &str) -> Value {
    match serde_json::from_str::<Value>(value) {
        Ok(parsed @ (Value::Number(_) | Value::Bool(_) | Value::Null | Value::String(_))) => parsed,
        _ => Value::String(value.to_owned()),
    }
}

/// Sends the request and copies the response line to `stdout`.
///
/// The exit code mirrors the envelope's `success` flag.
pub(crate) fn execute<W: Write>(
    config: &Config,
    request: &RequestEnvelope,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let mut connection = connect(config.listen_socket())?;
    let reader = connection.try_clone().map_err(AppError::ReadResponse)?;
    write_frame(&mut connection, request).map_err(AppError::SendRequest)?;

    let line = read_response(BufReader::new(reader))?;
    let envelope = Envelope::parse(&line).map_err(AppError::ParseResponse)?;

    stdout.write_all(&line).map_err(AppError::WriteOutput)?;
    stdout.write_all(b"\n").map_err(AppError::WriteOutput)?;
    stdout.flush().map_err(AppError::WriteOutput)?;

    Ok(if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_response<R: BufRead>(reader: R) -> Result<Vec<u8>, AppError> {
    let mut frames = FrameReader::with_limit(reader, MAX_RESPONSE_BYTES);
    match frames.read_frame().map_err(AppError::ReadResponse)? {
        Some(Frame::Line(line)) => Ok(line),
        Some(Frame::Oversized { max_size, .. }) => Err(AppError::ResponseTooLarge { max_size }),
        None => Err(AppError::MissingResponse),
    }
}
