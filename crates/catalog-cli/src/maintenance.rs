//! `catalog clear`: removes every item from the catalog.

use std::io::Write;

use catalog_store::ItemStore;

use crate::AppError;

/// Clears the catalog when `confirmed`, reporting how many items went.
pub(crate) fn clear<W: Write>(
    store: &mut ItemStore,
    confirmed: bool,
    out: &mut W,
) -> Result<usize, AppError> {
    if !confirmed {
        return Err(AppError::ClearNotConfirmed);
    }
    let removed = store.clear_all()?;
    writeln!(out, "removed {removed} items").map_err(AppError::WriteOutput)?;
    Ok(removed)
}
