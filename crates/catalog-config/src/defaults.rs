use camino::Utf8PathBuf;

use crate::socket::SocketEndpoint;

/// Default TCP port the daemon listens on.
pub const DEFAULT_TCP_PORT: u16 = 8080;

/// Default bind host; the wildcard address accepts clients on every interface.
pub const DEFAULT_TCP_HOST: &str = "0.0.0.0";

/// Default location of the SQLite catalog file.
pub const DEFAULT_DATABASE_PATH: &str = "./data/data.db";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default SQLite busy timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default endpoint the daemon binds and the CLI connects to.
#[must_use]
pub fn default_listen_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
}

/// Default catalog database path.
#[must_use]
pub fn default_database_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_DATABASE_PATH)
}

/// Default SQLite busy timeout.
#[must_use]
pub const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Whether the diagnostic `all` action is enabled unless configured otherwise.
#[must_use]
pub const fn default_allow_dump() -> bool {
    true
}
