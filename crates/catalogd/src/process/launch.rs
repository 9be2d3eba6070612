//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{CatalogConnectionHandler, RequestRouter};
use crate::health::HealthReporter;
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, listener startup or signal
/// installation fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let shutdown = SystemShutdownSignal::install()?;
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &shutdown)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(
    loader: &L,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &S,
) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let daemon = bootstrap_with(loader, reporter.as_ref())?;
    let (config, catalog) = daemon.into_parts();

    let listener = SocketListener::bind(config.listen_socket())?;
    let endpoint = listener.bound_endpoint();
    let router = RequestRouter::new(config.allow_dump());
    let handler = Arc::new(CatalogConnectionHandler::new(catalog, router));
    let listener_handle = listener.start(handler)?;
    reporter.listener_ready(&endpoint);

    let waited = shutdown.wait();
    reporter.shutdown_requested();
    listener_handle.stop();
    listener_handle.join()?;
    reporter.shutdown_complete();
    waited?;

    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
