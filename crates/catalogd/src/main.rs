use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match catalogd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr().lock(), "catalogd: {error}");
            ExitCode::FAILURE
        }
    }
}
