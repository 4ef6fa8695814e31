//! Tunables passed to connections and the server loop.

use std::time::Duration;

use ledipc_core::DEFAULT_MAX_FRAME_SIZE;

/// Deadline applied to client sends and receives.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the server waits for workers to finish after shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Pause after a failed `accept()` before trying again.
pub const DEFAULT_ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Per-connection settings.
///
/// `None` for a timeout means "wait forever".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub receive_timeout: Option<Duration>,
    pub send_timeout: Option<Duration>,
    pub max_frame_size: usize,
}

impl ConnectionConfig {
    /// Settings for a client: every call is bounded.
    pub fn client() -> Self {
        Self {
            receive_timeout: Some(DEFAULT_CLIENT_TIMEOUT),
            send_timeout: Some(DEFAULT_CLIENT_TIMEOUT),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Settings for a server-side worker.  Idle clients may stay connected
    /// indefinitely, so there are no deadlines.
    pub fn server() -> Self {
        Self {
            receive_timeout: None,
            send_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

/// Settings for [`crate::Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Applied to every accepted connection.
    pub connection: ConnectionConfig,
    pub shutdown_grace: Duration,
    pub accept_backoff: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::server(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            accept_backoff: DEFAULT_ACCEPT_BACKOFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_has_five_second_deadlines() {
        let cfg = ConnectionConfig::client();
        assert_eq!(cfg.receive_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.send_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.max_frame_size, 4096);
    }

    #[test]
    fn test_server_config_has_no_deadlines() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.connection.receive_timeout, None);
        assert_eq!(cfg.connection.send_timeout, None);
    }

    #[test]
    fn test_builders_override_single_field() {
        let cfg = ConnectionConfig::client()
            .with_receive_timeout(Some(Duration::from_millis(50)))
            .with_max_frame_size(128);
        assert_eq!(cfg.receive_timeout, Some(Duration::from_millis(50)));
        assert_eq!(cfg.send_timeout, Some(DEFAULT_CLIENT_TIMEOUT));
        assert_eq!(cfg.max_frame_size, 128);
    }
}
