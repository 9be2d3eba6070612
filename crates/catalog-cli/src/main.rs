//! Operator entry point for the item catalog.
//!
//! Delegates to [`catalog_cli::run`], which loads configuration, parses the
//! subcommand and either talks to `catalogd` or works on the catalog file
//! directly.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    catalog_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
