//! `catalog ingest`: bulk loading of item pages into the store.
//!
//! Pages are written one transaction at a time through [`ItemStore`], so a
//! running daemon keeps serving reads while a load is in progress. Loading
//! stops at the end of the source or after a run of consecutive empty pages,
//! whichever comes first.

mod source;

use std::io::Write;

use catalog_store::{ItemRecord, ItemStore, UpsertSummary};

use crate::AppError;
use crate::cli::IngestMode;

pub(crate) use source::{FilePageSource, PageSource};

/// Settings for one ingest run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IngestOptions {
    pub(crate) mode: IngestMode,
    /// Consecutive empty pages that end the run. Zero disables the check.
    pub(crate) empty_page_limit: usize,
}

/// Outcome of an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IngestReport {
    pub(crate) pages: usize,
    pub(crate) summary: UpsertSummary,
    pub(crate) stopped_on_empty: bool,
}

/// Drains `source` into `store`, printing progress to `out`.
pub(crate) fn run_ingest<S, W>(
    source: &mut S,
    store: &mut ItemStore,
    options: IngestOptions,
    out: &mut W,
) -> Result<IngestReport, AppError>
where
    S: PageSource + ?Sized,
    W: Write,
{
    let mut report = IngestReport::default();
    let mut consecutive_empty = 0_usize;

    while !limit_reached(options.empty_page_limit, consecutive_empty) {
        let Some(page) = source.next_page()? else {
            break;
        };
        report.pages += 1;

        if page.is_empty() {
            consecutive_empty += 1;
            writeln!(
                out,
                "[{}] no items ({consecutive_empty} consecutive empty)",
                page.label
            )
            .map_err(AppError::WriteOutput)?;
            continue;
        }
        consecutive_empty = 0;

        let mut written = write_page(store, options.mode, &page.records)?;
        written.failed += page.rejected;
        writeln!(
            out,
            "[{}] {} new, {} updated, {} failed",
            page.label, written.new, written.updated, written.failed
        )
        .map_err(AppError::WriteOutput)?;
        report.summary.absorb(written);
    }

    report.stopped_on_empty = limit_reached(options.empty_page_limit, consecutive_empty);
    if report.stopped_on_empty {
        writeln!(
            out,
            "stopped after {consecutive_empty} consecutive empty pages"
        )
        .map_err(AppError::WriteOutput)?;
    }
    let summary = report.summary;
    writeln!(
        out,
        "ingested {} pages: {} new, {} updated, {} failed",
        report.pages, summary.new, summary.updated, summary.failed
    )
    .map_err(AppError::WriteOutput)?;
    Ok(report)
}

fn limit_reached(limit: usize, consecutive_empty: usize) -> bool {
    limit > 0 && consecutive_empty >= limit
}

fn write_page(
    store: &mut ItemStore,
    mode: IngestMode,
    records: &[ItemRecord],
) -> Result<UpsertSummary, AppError> {
    match mode {
        IngestMode::Smart => Ok(store.upsert_batch_smart(records)?),
        IngestMode::Replace => {
            let written = store.insert_batch(records)?;
            Ok(UpsertSummary {
                new: written,
                updated: 0,
                failed: records.len() - written,
                total: written,
            })
        }
    }
}
