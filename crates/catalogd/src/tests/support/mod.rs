//! Test harness utilities for the daemon behavioural suites.

mod config_loader;
mod reporter;
mod server;

pub use config_loader::{ArgsConfigLoader, FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use server::{ChannelShutdown, RunningDaemon};
