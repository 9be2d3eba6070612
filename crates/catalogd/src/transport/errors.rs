//! Listener failures.

use std::io;

#[cfg(unix)]
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while binding the listen socket or running its accept loop.
///
/// Every bind-time variant is fatal to the daemon. Accept errors never reach
/// this type; the accept loop logs them and keeps polling.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured host name did not resolve.
    #[error("cannot resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced nothing to bind.
    #[error("{endpoint} resolved to no addresses")]
    NoAddress { endpoint: String },
    /// The operating system refused the bind.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking accepts.
    #[error("failed to configure {endpoint}: {source}")]
    Configure {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("failed to spawn accept thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("{endpoint}: Unix sockets are not available on this platform")]
    UnixUnsupported { endpoint: String },
    /// A live process already serves the socket path.
    #[cfg(unix)]
    #[error("{path} is served by another process")]
    SocketInUse { path: Utf8PathBuf },
    /// Something other than a socket occupies the path.
    #[cfg(unix)]
    #[error("{path} exists and is not a socket")]
    NotASocket { path: Utf8PathBuf },
    /// A leftover socket file could not be inspected or removed.
    #[cfg(unix)]
    #[error("failed to clear stale socket {path}: {source}")]
    StaleSocket {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("accept thread panicked")]
    AcceptPanicked,
}
