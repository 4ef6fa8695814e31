//! TOML-based configuration for the LED manager and its clients.
//!
//! One file serves all three personalities:
//!
//! ```toml
//! [transport]
//! endpoint = "/tmp/led_manager.sock"   # or "tcp://127.0.0.1:24900"
//! receive_timeout_ms = 5000            # client deadline, 0 = wait forever
//! send_timeout_ms = 5000
//! max_frame_size = 4096
//! shutdown_grace_ms = 2000
//!
//! [store]
//! root = "/tmp/sys/class"
//!
//! [log]
//! level = "info"
//! directory = "/tmp"
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, so a file
//! may set only what it wants to change and an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ledipc_core::DEFAULT_MAX_FRAME_SIZE;
use ledipc_transport::config::{DEFAULT_ACCEPT_BACKOFF, DEFAULT_CLIENT_TIMEOUT, DEFAULT_SHUTDOWN_GRACE};
use ledipc_transport::{ConnectionConfig, Endpoint, EndpointParseError, ServerConfig, DEFAULT_SOCKET_PATH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::state_store::file::DEFAULT_STORE_ROOT;

/// Smallest accepted `transport.max_frame_size`; a short error response must
/// always fit.
pub const MIN_FRAME_SIZE: usize = 64;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The endpoint string is not a valid endpoint.
    #[error("invalid transport endpoint: {0}")]
    Endpoint(#[from] EndpointParseError),

    /// A value parsed but is out of range.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Which side of the connection a [`ConnectionConfig`] is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Socket and framing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportSection {
    /// `unix:///path`, a bare absolute path, or `tcp://host:port`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// How long a client waits for a response.  `0` disables the deadline.
    #[serde(default = "default_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// How long a client may block writing a request.  `0` disables it.
    #[serde(default = "default_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    /// How long the server waits for open connections when shutting down.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Where the file-backed state store keeps LED states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSection {
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSection {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the `<ServiceName>.log` files.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_endpoint() -> String {
    DEFAULT_SOCKET_PATH.to_string()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_CLIENT_TIMEOUT.as_millis() as u64
}
fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}
fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE.as_millis() as u64
}
fn default_store_root() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_ROOT)
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_directory() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            receive_timeout_ms: default_timeout_ms(),
            send_timeout_ms: default_timeout_ms(),
            max_frame_size: default_max_frame_size(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

// ── Derived runtime settings ──────────────────────────────────────────────────

fn optional_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl AppConfig {
    /// Parses the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Endpoint`] when the string is not a valid endpoint.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Ok(self.transport.endpoint.parse()?)
    }

    /// Builds the per-connection settings for `role`.
    ///
    /// Server workers never time out on an idle client; clients use the
    /// configured deadlines.
    pub fn connection_config(&self, role: Role) -> ConnectionConfig {
        let base = match role {
            Role::Server => ConnectionConfig::server(),
            Role::Client => ConnectionConfig::client()
                .with_receive_timeout(optional_millis(self.transport.receive_timeout_ms))
                .with_send_timeout(optional_millis(self.transport.send_timeout_ms)),
        };
        base.with_max_frame_size(self.transport.max_frame_size)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            connection: self.connection_config(Role::Server),
            shutdown_grace: Duration::from_millis(self.transport.shutdown_grace_ms),
            accept_backoff: DEFAULT_ACCEPT_BACKOFF,
        }
    }

    /// Checks values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Endpoint`] or [`ConfigError::InvalidValue`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        // Payloads are decoded with a fixed ceiling, so larger frames would
        // pass the length check and then fail to decode.
        let size = self.transport.max_frame_size;
        if !(MIN_FRAME_SIZE..=DEFAULT_MAX_FRAME_SIZE).contains(&size) {
            return Err(ConfigError::InvalidValue(format!(
                "transport.max_frame_size must be between {MIN_FRAME_SIZE} and \
                 {DEFAULT_MAX_FRAME_SIZE}, got {size}"
            )));
        }
        Ok(())
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads and validates `AppConfig` from `path`, returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and the errors of
/// [`AppConfig::validate`].
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    config.validate()?;
    Ok(config)
}

/// Parses TOML text into an `AppConfig` without touching the file system.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.transport.endpoint, "/tmp/led_manager.sock");
        assert_eq!(cfg.transport.receive_timeout_ms, 5000);
        assert_eq!(cfg.transport.max_frame_size, 4096);
        assert_eq!(cfg.store.root, PathBuf::from("/tmp/sys/class"));
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.directory, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let text = r#"
            [transport]
            endpoint = "tcp://127.0.0.1:24900"

            [store]
            root = "/var/lib/ledipc"
        "#;

        // Act
        let cfg = parse_config(text).unwrap();

        // Assert
        assert_eq!(cfg.endpoint().unwrap(), Endpoint::tcp("127.0.0.1", 24900));
        assert_eq!(cfg.transport.send_timeout_ms, 5000);
        assert_eq!(cfg.store.root, PathBuf::from("/var/lib/ledipc"));
        assert_eq!(cfg.log, LogSection::default());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = parse_config("[transport\nendpoint = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = parse_config("[transport]\nmax_frame_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join(format!("ledipc-missing-{}.toml", uuid::Uuid::new_v4()));
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!("ledipc-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();

        // Act
        let cfg = load_config(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(cfg.unwrap().log.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint_and_zero_frame_size() {
        let mut cfg = AppConfig::default();
        cfg.transport.endpoint = "relative.sock".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Endpoint(_))));

        let mut cfg = AppConfig::default();
        cfg.transport.max_frame_size = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_validate_bounds_frame_size_by_payload_ceiling() {
        // Arrange
        let mut too_large = AppConfig::default();
        too_large.transport.max_frame_size = 8192;
        let mut too_small = AppConfig::default();
        too_small.transport.max_frame_size = MIN_FRAME_SIZE - 1;
        let mut smallest = AppConfig::default();
        smallest.transport.max_frame_size = MIN_FRAME_SIZE;

        // Act / Assert
        assert!(matches!(too_large.validate(), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(too_small.validate(), Err(ConfigError::InvalidValue(_))));
        assert!(smallest.validate().is_ok());
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parsed_config_with_oversized_frames_fails_validation() {
        let result = parse_config("[transport]\nmax_frame_size = 8192")
            .and_then(|cfg| cfg.validate().map(|()| cfg));

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_client_connection_config_uses_configured_deadlines() {
        let mut cfg = AppConfig::default();
        cfg.transport.receive_timeout_ms = 250;
        cfg.transport.send_timeout_ms = 0;

        let conn = cfg.connection_config(Role::Client);

        assert_eq!(conn.receive_timeout, Some(Duration::from_millis(250)));
        assert_eq!(conn.send_timeout, None, "0 disables the deadline");
    }

    #[test]
    fn test_server_connection_config_has_no_deadlines() {
        let mut cfg = AppConfig::default();
        cfg.transport.max_frame_size = 1024;
        cfg.transport.shutdown_grace_ms = 300;

        let server = cfg.server_config();

        assert_eq!(server.connection.receive_timeout, None);
        assert_eq!(server.connection.max_frame_size, 1024);
        assert_eq!(server.shutdown_grace, Duration::from_millis(300));
    }

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.transport.endpoint = "tcp://localhost:9000".to_string();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = parse_config(&text).expect("deserialize");

        assert_eq!(cfg, restored);
    }
}
