//! Page sources for `catalog ingest`.

use std::fs;
use std::vec;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use catalog_store::ItemRecord;

use crate::AppError;

/// One page of item records.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Page {
    /// Where the page came from, used in progress output.
    pub(crate) label: String,
    /// Records that decoded cleanly.
    pub(crate) records: Vec<ItemRecord>,
    /// Entries that were present on the page but could not be decoded.
    pub(crate) rejected: usize,
}

impl Page {
    /// A page is empty when it carried no entries at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected == 0
    }
}

/// Supplies pages in order until exhausted.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait PageSource {
    /// Returns the next page, or `None` once the source is exhausted.
    fn next_page(&mut self) -> Result<Option<Page>, AppError>;
}

/// Reads one page per file, in the order given.
#[derive(Debug)]
pub(crate) struct FilePageSource {
    files: vec::IntoIter<Utf8PathBuf>,
}

impl FilePageSource {
    pub(crate) fn new(files: Vec<Utf8PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
        }
    }
}

impl PageSource for FilePageSource {
    fn next_page(&mut self) -> Result<Option<Page>, AppError> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let bytes = fs::read(&path).map_err(|source| AppError::ReadPage {
            path: path.clone(),
            source,
        })?;
        decode_page(&path, &bytes).map(Some)
    }
}

/// Decodes a page file.
///
/// Accepts a bare array of records or the marketplace envelope
/// `{"Code": 0, "Data": [...]}`. A non-zero `Code` or a null `Data` yields an
/// empty page.
pub(crate) fn decode_page(path: &Utf8Path, bytes: &[u8]) -> Result<Page, AppError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| AppError::ParsePage {
        path: path.to_owned(),
        source,
    })?;
    let unrecognised = || AppError::UnrecognisedPage {
        path: path.to_owned(),
    };

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut envelope) if envelope.contains_key("Code") => {
            let code = envelope.get("Code").and_then(Value::as_i64).unwrap_or(-1);
            if code != 0 {
                Vec::new()
            } else {
                match envelope.remove("Data") {
                    Some(Value::Array(entries)) => entries,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => return Err(unrecognised()),
                }
            }
        }
        _ => return Err(unrecognised()),
    };

    let mut page = Page {
        label: path.to_string(),
        ..Page::default()
    };
    for entry in entries {
        match ItemRecord::from_value(entry) {
            Ok(record) => page.records.push(record),
            Err(_) => page.rejected += 1,
        }
    }
    Ok(page)
}
