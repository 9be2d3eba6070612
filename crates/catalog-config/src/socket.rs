use std::fmt;
use std::fs::DirBuilder;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

/// Declarative configuration for the catalog listen socket.
///
/// The daemon binds this endpoint; the CLI connects to it. TCP endpoints bound
/// to a wildcard address are reached through loopback by local clients (see
/// [`SocketEndpoint::connect_host`]).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix { path: Utf8PathBuf },
    /// TCP socket endpoint.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Host a client should dial for a TCP endpoint.
    ///
    /// Wildcard bind addresses (`0.0.0.0`, `::`) are not routable targets, so
    /// they map to the matching loopback address. Other hosts are returned
    /// unchanged. Unix endpoints return `None`.
    #[must_use]
    pub fn connect_host(&self) -> Option<String> {
        let Self::Tcp { host, .. } = self else {
            return None;
        };
        let mapped = match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) if addr.is_unspecified() => Ipv4Addr::LOCALHOST.to_string(),
            Ok(IpAddr::V6(addr)) if addr.is_unspecified() => Ipv6Addr::LOCALHOST.to_string(),
            _ => host.clone(),
        };
        Some(mapped)
    }

    /// Ensures a Unix socket's parent directory exists with restrictive
    /// permissions. TCP endpoints need no preparation.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } if host.contains(':') => {
                write!(formatter, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    /// Parses `tcp://host:port` or `unix:///absolute/path`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input).map_err(|source| SocketParseError::InvalidUrl {
            input: input.to_owned(),
            source,
        })?;
        match url.scheme() {
            "tcp" => tcp_from_url(input, &url),
            "unix" => unix_from_url(input, &url),
            scheme => Err(SocketParseError::UnknownScheme {
                input: input.to_owned(),
                scheme: scheme.to_owned(),
            }),
        }
    }
}

fn tcp_from_url(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    // IPv6 literals keep their brackets in `host_str`.
    let host = match url.host() {
        Some(Host::Ipv6(addr)) => addr.to_string(),
        Some(_) => url.host_str().unwrap_or_default().to_owned(),
        None => return Err(SocketParseError::NoHost(input.to_owned())),
    };
    let port = url
        .port()
        .ok_or_else(|| SocketParseError::NoPort(input.to_owned()))?;
    Ok(SocketEndpoint::tcp(host, port))
}

fn unix_from_url(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    match url.path() {
        "" | "/" => Err(SocketParseError::NoPath(input.to_owned())),
        path => Ok(SocketEndpoint::unix(path)),
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// The text is not a URL at all.
    #[error("'{input}' is not a socket URL: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    /// Only `tcp` and `unix` are understood.
    #[error("'{input}' uses unsupported scheme '{scheme}'; expected tcp or unix")]
    UnknownScheme { input: String, scheme: String },
    #[error("'{0}' names no TCP host")]
    NoHost(String),
    #[error("'{0}' names no TCP port")]
    NoPort(String),
    #[error("'{0}' names no Unix socket path")]
    NoPath(String),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Parent directory is missing when creating a Unix socket path.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Failed to create or adjust socket directories.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn display_unix_socket() {
        let endpoint = SocketEndpoint::unix(Utf8PathBuf::from("/tmp/catalog.sock"));
        assert_eq!(endpoint.to_string(), "unix:///tmp/catalog.sock");
    }

    #[rstest]
    #[case::wildcard("tcp://0.0.0.0:8080", SocketEndpoint::tcp("0.0.0.0", 8080))]
    #[case::named("tcp://localhost:9000", SocketEndpoint::tcp("localhost", 9000))]
    #[case::ipv6("tcp://[::1]:8080", SocketEndpoint::tcp("::1", 8080))]
    #[case::unix("unix:///run/catalogd.sock", SocketEndpoint::unix("/run/catalogd.sock"))]
    fn parses_endpoints(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("parse endpoint");
        assert_eq!(endpoint, expected);
        assert_eq!(endpoint.to_string().parse::<SocketEndpoint>().ok(), Some(expected));
    }

    #[rstest]
    #[case::missing_port("tcp://127.0.0.1")]
    #[case::bad_scheme("udp://127.0.0.1:53")]
    #[case::not_a_url("localhost:8080")]
    #[case::no_path("unix://")]
    fn rejects_invalid_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err(), "{input} should fail");
    }

    #[rstest]
    #[case::wildcard_v4("0.0.0.0", "127.0.0.1")]
    #[case::wildcard_v6("::", "::1")]
    #[case::named("localhost", "localhost")]
    #[case::explicit("10.1.2.3", "10.1.2.3")]
    fn maps_wildcard_hosts_to_loopback(#[case] host: &str, #[case] expected: &str) {
        let endpoint = SocketEndpoint::tcp(host, 8080);
        assert_eq!(endpoint.connect_host().as_deref(), Some(expected));
    }

    #[test]
    fn unix_endpoint_has_no_connect_host() {
        assert!(SocketEndpoint::unix("/tmp/catalog.sock").connect_host().is_none());
    }

    #[test]
    fn prepare_filesystem_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("run").join("catalogd.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        endpoint.prepare_filesystem().expect("prepare socket dir");
        assert!(dir.path().join("run").is_dir());
    }
}
