//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};

use super::support::{FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestConfigLoader};

struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    database_path: Option<Utf8PathBuf>,
    reporter: Arc<RecordingHealthReporter>,
    outcome: Option<Result<Daemon, BootstrapError>>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self::with_loader(TestConfigLoader::new())
    }

    fn with_loader(loader: TestConfigLoader) -> Self {
        Self {
            database_path: Some(loader.database_path()),
            loader: Box::new(loader),
            reporter: Arc::new(RecordingHealthReporter::default()),
            outcome: None,
        }
    }

    fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.database_path = None;
    }

    fn bootstrap(&mut self) {
        self.outcome = Some(bootstrap_with(&*self.loader, self.reporter.as_ref()));
    }

    fn error(&self) -> Option<&BootstrapError> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    *world.borrow_mut() = BootstrapWorld::new();
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a configuration whose database directory is a file")]
fn given_blocked_database(world: &RefCell<BootstrapWorld>) {
    let mut loader = TestConfigLoader::new();
    loader.block_database_directory();
    *world.borrow_mut() = BootstrapWorld::with_loader(loader);
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    let outcome = world.outcome.as_ref().expect("bootstrap did not run");
    assert!(outcome.is_ok(), "bootstrap error: {:?}", world.error());
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>) {
    assert!(
        world.borrow().error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the catalog database exists")]
fn then_database_exists(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    let path = world.database_path.as_ref().expect("database path");
    assert!(path.exists(), "expected {path} to exist");
    let daemon = world
        .outcome
        .as_ref()
        .and_then(|outcome| outcome.as_ref().ok())
        .expect("daemon");
    assert_eq!(daemon.catalog().path(), path.as_path());
}

#[then("the failure mentions {text}")]
fn then_failure_mentions(world: &RefCell<BootstrapWorld>, text: String) {
    let text = text.trim_matches('"');
    let message = world
        .borrow()
        .error()
        .map(ToString::to_string)
        .expect("bootstrap error");
    assert!(message.contains(text), "'{message}' does not mention '{text}'");
}

#[then("the health reporter recorded a successful bootstrap")]
fn then_reporter_recorded_success(world: &RefCell<BootstrapWorld>) {
    assert_eq!(
        world.borrow().reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[then("the health reporter recorded a failed bootstrap")]
fn then_reporter_recorded_failure(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert!(
        matches!(events.last(), Some(HealthEvent::BootstrapFailed(_))),
        "unexpected events: {events:?}"
    );
}

#[scenario(path = "tests/features/daemon_bootstrap.feature", index = 0)]
fn bootstrap_opens_catalog(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/daemon_bootstrap.feature", index = 1)]
fn bootstrap_reports_configuration_failures(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/daemon_bootstrap.feature", index = 2)]
fn bootstrap_reports_store_failures(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}
