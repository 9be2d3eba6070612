//! Shared configuration for the catalog daemon and CLI.
//!
//! Configuration is layered by [`ortho_config`]: command-line flags override
//! `CATALOG_*` environment variables, which override a TOML configuration file
//! (`--config-path`, `CATALOG_CONFIG_PATH`, or a discovered `.catalog.toml`),
//! which overrides the built-in defaults in [`defaults`].

mod defaults;
mod logging;
mod socket;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_PATH, DEFAULT_LOG_FILTER, DEFAULT_TCP_HOST,
    DEFAULT_TCP_PORT, default_allow_dump, default_busy_timeout_ms, default_database_path,
    default_listen_socket, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `catalogd` and `catalog`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CATALOG")]
pub struct Config {
    /// Endpoint the daemon listens on and the CLI connects to.
    #[serde(default = "default_listen_socket")]
    #[ortho_config(default = default_listen_socket())]
    pub listen_socket: SocketEndpoint,
    /// Path of the SQLite catalog file.
    #[serde(default = "default_database_path")]
    #[ortho_config(default = default_database_path())]
    pub database_path: Utf8PathBuf,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// How long a store handle waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    #[ortho_config(default = default_busy_timeout_ms())]
    pub busy_timeout_ms: u64,
    /// Enables the diagnostic `all` action for remote clients.
    ///
    /// Left unset unless a layer supplies it, so an absent `--allow-dump`
    /// flag never masks the file or environment value.
    #[serde(default)]
    pub allow_dump: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_listen_socket(),
            database_path: default_database_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            busy_timeout_ms: default_busy_timeout_ms(),
            allow_dump: None,
        }
    }
}

impl Config {
    /// Endpoint the daemon binds.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Location of the catalog database.
    #[must_use]
    pub fn database_path(&self) -> &Utf8Path {
        self.database_path.as_path()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Busy timeout applied to every store handle.
    #[must_use]
    pub fn busy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.busy_timeout_ms)
    }

    /// Whether remote clients may run the unfiltered `all` scan.
    #[must_use]
    pub fn allow_dump(&self) -> bool {
        self.allow_dump.unwrap_or_else(default_allow_dump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_values() {
        let config = Config::default();
        assert_eq!(config.listen_socket(), &SocketEndpoint::tcp("0.0.0.0", 8080));
        assert_eq!(config.database_path().as_str(), "./data/data.db");
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.busy_timeout(), std::time::Duration::from_secs(5));
        assert!(config.allow_dump());
    }

    #[test]
    fn explicit_dump_setting_overrides_the_default() {
        let config = Config {
            allow_dump: Some(false),
            ..Config::default()
        };
        assert!(!config.allow_dump());
    }
}
