//! Socket endpoint addressing.
//!
//! Accepted string forms:
//!
//! | Input                    | Endpoint                          |
//! |--------------------------|-----------------------------------|
//! | `unix:///tmp/led.sock`   | `Unix { path: "/tmp/led.sock" }`  |
//! | `/tmp/led.sock`          | `Unix { path: "/tmp/led.sock" }`  |
//! | `tcp://127.0.0.1:9000`   | `Tcp { host: "127.0.0.1", port }` |
//! | `tcp://[::1]:9000`       | `Tcp { host: "::1", port }`       |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Socket path used by the LED manager when nothing else is configured.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/led_manager.sock";

const UNIX_SCHEME: &str = "unix://";
const TCP_SCHEME: &str = "tcp://";

/// Errors produced while parsing an endpoint string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("endpoint is empty")]
    Empty,

    #[error("unsupported endpoint scheme in '{0}' (expected unix:// or tcp://)")]
    UnsupportedScheme(String),

    #[error("unix socket path must be absolute: '{0}'")]
    RelativePath(String),

    #[error("invalid tcp address '{0}' (expected tcp://host:port)")]
    InvalidTcpAddress(String),
}

/// Where a server listens or a client connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A Unix domain socket at an absolute filesystem path.
    Unix { path: PathBuf },
    /// A TCP host and port.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix { path: path.into() }
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path for Unix endpoints.
    pub fn unix_path(&self) -> Option<&std::path::Path> {
        match self {
            Endpoint::Unix { path } => Some(path),
            Endpoint::Tcp { .. } => None,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::unix(DEFAULT_SOCKET_PATH)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix { path } => write!(f, "{UNIX_SCHEME}{}", path.display()),
            Endpoint::Tcp { host, port } if host.contains(':') => {
                write!(f, "{TCP_SCHEME}[{host}]:{port}")
            }
            Endpoint::Tcp { host, port } => write!(f, "{TCP_SCHEME}{host}:{port}"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EndpointParseError::Empty);
        }

        if let Some(path) = trimmed.strip_prefix(UNIX_SCHEME) {
            return parse_unix_path(path);
        }
        if let Some(address) = trimmed.strip_prefix(TCP_SCHEME) {
            return parse_tcp_address(address)
                .ok_or_else(|| EndpointParseError::InvalidTcpAddress(trimmed.to_string()));
        }
        if trimmed.contains("://") {
            return Err(EndpointParseError::UnsupportedScheme(trimmed.to_string()));
        }
        parse_unix_path(trimmed)
    }
}

fn parse_unix_path(path: &str) -> Result<Endpoint, EndpointParseError> {
    if path.is_empty() {
        return Err(EndpointParseError::Empty);
    }
    if !path.starts_with('/') {
        return Err(EndpointParseError::RelativePath(path.to_string()));
    }
    Ok(Endpoint::unix(path))
}

fn parse_tcp_address(address: &str) -> Option<Endpoint> {
    let (host, port) = address.rsplit_once(':')?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Some(Endpoint::tcp(host, port))
}
