//! Request server for the item catalog.
//!
//! `catalogd` loads its configuration through [`catalog_config`], installs
//! structured telemetry, opens the shared [`catalog_store::Catalog`] and then
//! serves newline-delimited JSON requests on the configured socket until a
//! termination signal arrives.
//!
//! Each accepted connection runs on its own thread with its own store handle.
//! A connection may carry any number of requests; every request receives
//! exactly one response envelope, including requests that fail to decode. Only
//! read queries are reachable remotely. Bulk ingestion and maintenance go
//! through the `catalog` CLI, which writes to the same database file.

mod bootstrap;
mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
