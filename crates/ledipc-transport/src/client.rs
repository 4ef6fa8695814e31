//! Client side of the transport: one connection, one outstanding call.

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, ConnectionId, FrameReceiver, FrameSender};
use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::stream::ConnectionStream;

/// A connected client.
///
/// [`ClientSession::call`] sends one request frame and waits for one response
/// frame.  Nothing is retried: a timeout or disconnect is reported to the
/// caller and leaves the session closed.
#[derive(Debug)]
pub struct ClientSession {
    endpoint: Endpoint,
    connection: Connection<ConnectionStream>,
}

impl ClientSession {
    /// Connects to a server at `endpoint`.
    ///
    /// The connect is bounded by `config.send_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] when no server is reachable,
    /// e.g. the socket file is missing or nothing is listening on it.
    pub async fn connect(
        endpoint: &Endpoint,
        config: ConnectionConfig,
    ) -> Result<Self, TransportError> {
        let connect = ConnectionStream::connect(endpoint);
        let stream = match config.send_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .unwrap_or_else(|_| Err(std::io::ErrorKind::TimedOut.into())),
            None => connect.await,
        }
        .map_err(|source| TransportError::ConnectFailed {
            endpoint: endpoint.to_string(),
            source,
        })?;

        debug!(endpoint = %endpoint, "connected");
        Ok(Self {
            endpoint: endpoint.clone(),
            connection: Connection::new(ConnectionId::new(0), stream, config),
        })
    }

    /// Sends `request` and returns the payload of the next response frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Timeout`] – no response within the receive deadline.
    /// - [`TransportError::Closed`] – the server hung up (for example because it
    ///   dropped an undecodable request and then the connection).
    /// - [`TransportError::NotConnected`] – an earlier call already failed.
    pub async fn call(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.connection.send(request).await?;
        self.connection.receive().await
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub async fn close(&mut self) {
        self.connection.close().await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_to_missing_socket_is_connect_failed() {
        // Arrange
        let path = std::env::temp_dir().join(format!("ledipc-absent-{}.sock", uuid::Uuid::new_v4()));

        // Act
        let result = ClientSession::connect(&Endpoint::unix(&path), ConnectionConfig::client()).await;

        // Assert
        match result {
            Err(TransportError::ConnectFailed { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected ConnectFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_to_closed_tcp_port_is_connect_failed() {
        // Bind and immediately drop to find a port with nothing listening.
        let port = {
            let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            spare.local_addr().unwrap().port()
        };

        let result =
            ClientSession::connect(&Endpoint::tcp("127.0.0.1", port), ConnectionConfig::client()).await;

        assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
    }
}
