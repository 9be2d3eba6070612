//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use catalog_config::{Config, LogFormat, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that keeps the database under a temporary directory and binds an
/// ephemeral loopback port.
pub struct TestConfigLoader {
    dir: TempDir,
    allow_dump: bool,
    database_override: Option<Utf8PathBuf>,
    listen_socket: Option<SocketEndpoint>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
            allow_dump: true,
            database_override: None,
            listen_socket: None,
        }
    }

    /// Root of the scratch directory.
    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8")
    }

    /// Database location this loader configures.
    pub fn database_path(&self) -> Utf8PathBuf {
        self.database_override
            .clone()
            .unwrap_or_else(|| self.root().join("data").join("catalog.db"))
    }

    pub fn disable_dump(&mut self) {
        self.allow_dump = false;
    }

    /// Points the database below a regular file so the catalog cannot be
    /// created.
    pub fn block_database_directory(&mut self) {
        let blocker = self.root().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("write blocker file");
        self.database_override = Some(blocker.join("catalog.db"));
    }

    /// Serves on a Unix socket inside the scratch directory.
    pub fn use_unix_socket(&mut self) {
        self.listen_socket = Some(SocketEndpoint::unix(self.root().join("run").join("catalogd.sock")));
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: self
                .listen_socket
                .clone()
                .unwrap_or_else(|| SocketEndpoint::tcp("127.0.0.1", 0)),
            database_path: self.database_path(),
            log_format: LogFormat::Compact,
            log_filter: "warn".to_owned(),
            allow_dump: Some(self.allow_dump),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid socket flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("catalogd"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}

/// Loader that resolves configuration through the real layered loader,
/// supplying only the database path and listen socket on the command line.
pub struct ArgsConfigLoader {
    dir: TempDir,
    extra: Vec<OsString>,
}

impl ArgsConfigLoader {
    #[must_use]
    pub fn new(extra: &[&str]) -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
            extra: extra.iter().map(OsString::from).collect(),
        }
    }
}

impl ConfigLoader for ArgsConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let database = self.dir.path().join("catalog.db");
        let mut args = vec![
            OsString::from("catalogd"),
            OsString::from("--listen-socket"),
            OsString::from("tcp://127.0.0.1:0"),
            OsString::from("--database-path"),
            database.into_os_string(),
            OsString::from("--log-format"),
            OsString::from("compact"),
        ];
        args.extend(self.extra.iter().cloned());
        Config::load_from_iter(args)
    }
}
