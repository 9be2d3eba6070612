//! Command-line definitions for the `catalog` binary.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

/// Operator tool for the item catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog", disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Sends one request to the running daemon and prints the response.
    Query {
        /// Action name, for example `cheapest` or `search_name`.
        #[arg(value_name = "ACTION")]
        action: String,
        /// Request parameter as `key=value`; may be repeated.
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Loads item pages from JSON files straight into the catalog.
    Ingest {
        /// How records are written.
        #[arg(long, value_enum, default_value_t = IngestMode::Smart)]
        mode: IngestMode,
        /// Stop after this many consecutive pages without items.
        #[arg(long, default_value_t = 3)]
        empty_page_limit: usize,
        /// Page files, read in the order given.
        #[arg(value_name = "FILE", required = true)]
        files: Vec<Utf8PathBuf>,
    },
    /// Deletes every item from the catalog.
    Clear {
        /// Required acknowledgement that all items will be removed.
        #[arg(long)]
        confirm: bool,
    },
}

/// Write strategy for `ingest`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum IngestMode {
    /// Insert new items in full and refresh only market fields of known ones.
    #[default]
    Smart,
    /// Overwrite every field of every record.
    Replace,
}
