//! Command-line runtime for the `catalog` operator tool.
//!
//! `catalog query` talks to a running `catalogd` over its listen socket.
//! `catalog ingest` and `catalog clear` open the catalog database directly,
//! sharing it with the daemon through SQLite's own locking. Configuration
//! flags placed before the subcommand are resolved by `ortho_config` exactly
//! as the daemon resolves them, so both tools agree on the socket and the
//! database path.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use catalog_config::Config;
use catalog_store::{Catalog, CatalogOptions, ItemStore};

mod cli;
mod config;
mod errors;
mod ingest;
mod maintenance;
mod query;
mod transport;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;
use ingest::{FilePageSource, IngestOptions, run_ingest};

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let result = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => loader
            .load(&split.config_arguments)
            .and_then(|config| execute(cli.command, &config, stdout)),
        Err(error) if is_informational(&error) => {
            let _ = write!(stdout, "{}", error.render());
            return ExitCode::SUCCESS;
        }
        Err(error) => Err(AppError::CliUsage(error)),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

fn execute<W: Write>(
    command: CliCommand,
    config: &Config,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    match command {
        CliCommand::Query { action, params } => {
            let request = query::build_request(&action, &params)?;
            query::execute(config, &request, stdout)
        }
        CliCommand::Ingest {
            mode,
            empty_page_limit,
            files,
        } => {
            let mut store = open_store(config)?;
            let mut source = FilePageSource::new(files);
            let options = IngestOptions {
                mode,
                empty_page_limit,
            };
            run_ingest(&mut source, &mut store, options, stdout)?;
            store.close()?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Clear { confirm } => {
            if !confirm {
                return Err(AppError::ClearNotConfirmed);
            }
            let mut store = open_store(config)?;
            maintenance::clear(&mut store, confirm, stdout)?;
            store.close()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(config: &Config) -> Result<ItemStore, AppError> {
    let options = CatalogOptions {
        busy_timeout: config.busy_timeout(),
    };
    let catalog = Catalog::open(config.database_path(), options)?;
    Ok(catalog.store()?)
}
