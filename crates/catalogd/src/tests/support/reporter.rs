//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use catalog_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketEndpoint),
    ShutdownRequested,
    ShutdownComplete,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
    changed: Condvar,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Blocks until the listener reports readiness and returns its endpoint.
    pub fn wait_for_listener(&self, timeout: Duration) -> Option<SocketEndpoint> {
        let events = self.events.lock().expect("health reporter mutex poisoned");
        let (events, _) = self
            .changed
            .wait_timeout_while(events, timeout, |events| {
                !events.iter().any(|event| {
                    matches!(
                        event,
                        HealthEvent::ListenerReady(_) | HealthEvent::BootstrapFailed(_)
                    )
                })
            })
            .expect("health reporter mutex poisoned");
        events.iter().find_map(|event| match event {
            HealthEvent::ListenerReady(endpoint) => Some(endpoint.clone()),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
        self.changed.notify_all();
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerReady(endpoint.clone()));
    }

    fn shutdown_requested(&self) {
        self.record(HealthEvent::ShutdownRequested);
    }

    fn shutdown_complete(&self) {
        self.record(HealthEvent::ShutdownComplete);
    }
}
