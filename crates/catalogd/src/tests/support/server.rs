//! Runs a full daemon on a background thread for end-to-end scenarios.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use catalog_config::SocketEndpoint;
use catalog_protocol::Envelope;

use crate::health::HealthReporter;
use crate::process::launch::run_daemon_with;
use crate::process::{LaunchError, ShutdownError, ShutdownSignal};

use super::config_loader::TestConfigLoader;
use super::reporter::RecordingHealthReporter;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shutdown signal triggered by sending on a channel.
pub struct ChannelShutdown {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdown {
    pub fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("shutdown receiver poisoned");
        // A dropped sender also means the test is done with the daemon.
        let _ = receiver.recv();
        Ok(())
    }
}

/// Handle to a daemon running on a background thread.
pub struct RunningDaemon {
    pub reporter: Arc<RecordingHealthReporter>,
    endpoint: Option<SocketEndpoint>,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<Result<(), LaunchError>>>,
}

impl RunningDaemon {
    /// Starts the daemon and waits until it accepts connections or fails.
    pub fn start(loader: TestConfigLoader) -> Self {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let (stop, shutdown) = ChannelShutdown::new();
        let thread_reporter: Arc<dyn HealthReporter> = reporter.clone();
        let thread = thread::spawn(move || run_daemon_with(&loader, thread_reporter, &shutdown));
        let endpoint = reporter.wait_for_listener(READY_TIMEOUT);
        Self {
            reporter,
            endpoint,
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    /// Endpoint the daemon reported as ready, if it came up.
    pub fn endpoint(&self) -> Option<&SocketEndpoint> {
        self.endpoint.as_ref()
    }

    /// Opens a new client connection.
    pub fn connect(&self) -> Client {
        let endpoint = self.endpoint.as_ref().expect("daemon is not listening");
        Client::connect(endpoint)
    }

    /// Signals shutdown and waits for the launch sequence to return.
    pub fn stop(&mut self) -> Option<Result<(), LaunchError>> {
        self.stop.take();
        self.thread
            .take()
            .map(|thread| thread.join().expect("daemon thread panicked"))
    }
}

impl Drop for RunningDaemon {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Line-oriented client speaking the catalog protocol.
pub struct Client {
    writer: Box<dyn Write + Send>,
    reader: BufReader<Box<dyn Read + Send>>,
}

impl Client {
    fn connect(endpoint: &SocketEndpoint) -> Self {
        match endpoint {
            SocketEndpoint::Tcp { port, .. } => {
                let host = endpoint.connect_host().expect("tcp host");
                let stream = TcpStream::connect((host.as_str(), *port)).expect("connect tcp");
                let reader = stream.try_clone().expect("clone tcp stream");
                Self {
                    writer: Box::new(stream),
                    reader: BufReader::new(Box::new(reader)),
                }
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => {
                let stream = std::os::unix::net::UnixStream::connect(path.as_std_path())
                    .expect("connect unix");
                let reader = stream.try_clone().expect("clone unix stream");
                Self {
                    writer: Box::new(stream),
                    reader: BufReader::new(Box::new(reader)),
                }
            }
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => panic!("unix sockets are unsupported"),
        }
    }

    /// Sends one raw request line and reads one envelope back.
    pub fn request(&mut self, line: &str) -> Envelope {
        self.writer.write_all(line.as_bytes()).expect("write request");
        self.writer.write_all(b"\n").expect("write delimiter");
        self.writer.flush().expect("flush request");
        let mut response = String::new();
        self.reader.read_line(&mut response).expect("read response");
        Envelope::parse(response.as_bytes()).expect("parse envelope")
    }
}
