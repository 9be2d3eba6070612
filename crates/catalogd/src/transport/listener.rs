//! Accept loop for the request server.
//!
//! The bound socket is polled without blocking so the loop can notice a stop
//! request within one idle interval. Each accepted stream is switched back to
//! blocking mode and served on its own named thread.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

#[cfg(unix)]
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use catalog_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

/// Sleep between polls when no client is waiting.
const IDLE_POLL: Duration = Duration::from_millis(25);
/// Sleep after a failed accept before polling again.
const ERROR_POLL: Duration = Duration::from_millis(150);

/// A bound, not yet accepting, listen socket.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    socket: BoundSocket,
}

impl SocketListener {
    /// Binds `endpoint`, clearing a stale Unix socket file first.
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let socket = match endpoint {
            SocketEndpoint::Tcp { host, port } => BoundSocket::Tcp(bind_tcp(endpoint, host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => BoundSocket::Unix {
                listener: bind_unix(path)?,
                path: path.clone(),
            },
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnixUnsupported {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Address a TCP socket actually bound; differs from the configured one
    /// when port `0` was requested.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            BoundSocket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            BoundSocket::Unix { .. } => None,
        }
    }

    /// Endpoint clients should dial to reach this listener.
    pub(crate) fn bound_endpoint(&self) -> SocketEndpoint {
        match (&self.endpoint, self.local_addr()) {
            (SocketEndpoint::Tcp { host, .. }, Some(addr)) => {
                SocketEndpoint::tcp(host.clone(), addr.port())
            }
            (endpoint, _) => endpoint.clone(),
        }
    }

    /// Moves the socket onto a background accept thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.socket
            .set_nonblocking()
            .map_err(|source| ListenerError::Configure {
                endpoint: self.endpoint.to_string(),
                source,
            })?;

        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            stop: Arc::clone(&stop),
            handler,
        };
        let thread = thread::Builder::new()
            .name("catalogd-accept".to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::Spawn { source })?;

        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Controls a running accept loop. Dropping the handle asks the loop to stop.
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to exit after its current poll.
    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Waits for the accept loop to exit. Connection workers are not joined.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::AcceptPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
}

impl AcceptLoop {
    fn run(self) {
        let endpoint = &self.listener.endpoint;
        info!(target: LISTENER_TARGET, %endpoint, "accepting connections");

        // Only the first of a run of identical accept errors is logged.
        let mut last_failure: Option<io::ErrorKind> = None;
        while !self.stop.load(Ordering::Acquire) {
            match self.listener.socket.poll_accept() {
                Ok(Some(stream)) => {
                    last_failure = None;
                    spawn_worker(stream, &self.handler);
                }
                Ok(None) => thread::sleep(IDLE_POLL),
                Err(error) => {
                    if last_failure.replace(error.kind()) != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %endpoint, %error, "accept failed");
                    }
                    thread::sleep(ERROR_POLL);
                }
            }
        }

        info!(target: LISTENER_TARGET, %endpoint, "listener stopped");
    }
}

fn spawn_worker(stream: ConnectionStream, handler: &Arc<dyn ConnectionHandler>) {
    let peer = stream.peer_label();
    let handler = Arc::clone(handler);
    let spawned = thread::Builder::new()
        .name(format!("catalogd-conn-{peer}"))
        .spawn(move || handler.handle(stream));
    match spawned {
        Ok(_) => debug!(target: LISTENER_TARGET, %peer, "connection accepted"),
        Err(error) => warn!(
            target: LISTENER_TARGET,
            %peer,
            %error,
            "failed to spawn connection worker"
        ),
    }
}

#[derive(Debug)]
enum BoundSocket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix {
        listener: UnixListener,
        path: Utf8PathBuf,
    },
}

impl BoundSocket {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix { listener, .. } => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending client, or returns `None` when nobody is waiting.
    fn poll_accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix { listener, .. } => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

// The socket file belongs to the listener that bound it.
#[cfg(unix)]
impl Drop for BoundSocket {
    fn drop(&mut self) {
        let Self::Unix { path, .. } = self else {
            return;
        };
        if let Err(error) = fs::remove_file(path.as_std_path())
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(target: LISTENER_TARGET, %path, %error, "failed to remove socket file");
        }
    }
}

fn bind_tcp(endpoint: &SocketEndpoint, host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::NoAddress {
            endpoint: endpoint.to_string(),
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(unix)]
fn bind_unix(path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    clear_stale_socket(path)?;
    UnixListener::bind(path.as_std_path()).map_err(|source| ListenerError::Bind {
        endpoint: SocketEndpoint::unix(path).to_string(),
        source,
    })
}

/// Removes a socket file left behind by a daemon that is no longer running.
///
/// Regular files and sockets with a live peer are left alone.
#[cfg(unix)]
fn clear_stale_socket(path: &Utf8Path) -> Result<(), ListenerError> {
    let stale = |source| ListenerError::StaleSocket {
        path: path.to_path_buf(),
        source,
    };
    let metadata = match fs::symlink_metadata(path.as_std_path()) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(stale(error)),
    };
    if !metadata.file_type().is_socket() {
        return Err(ListenerError::NotASocket {
            path: path.to_path_buf(),
        });
    }

    match UnixStream::connect(path.as_std_path()) {
        Ok(_) => Err(ListenerError::SocketInUse {
            path: path.to_path_buf(),
        }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            debug!(target: LISTENER_TARGET, %path, "removing stale socket file");
            fs::remove_file(path.as_std_path()).map_err(stale)
        }
        Err(error) => Err(stale(error)),
    }
}
