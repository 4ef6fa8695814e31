//! Transport-level error type.

use std::io;
use std::time::Duration;

use ledipc_core::ProtocolError;
use thiserror::Error;

/// Errors raised by connections, the server loop and client sessions.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing is listening at the endpoint, or the connect itself failed.
    #[error("failed to connect to {endpoint}: {source}")]
    ConnectFailed {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The listener could not be created.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// A live server already answers on this Unix socket path.
    #[error("{endpoint} is already in use by a running server")]
    AddressInUse { endpoint: String },

    /// The Unix socket path exists but is some other kind of file.
    #[error("{path} exists and is not a socket")]
    NotASocket { path: String },

    /// An I/O error on an established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the stream cleanly between frames.
    #[error("connection closed by peer")]
    Closed,

    /// The peer closed the stream while a frame was only partly received.
    #[error("connection closed by peer with {buffered} bytes of an incomplete frame")]
    ClosedMidFrame { buffered: usize },

    /// A send or receive deadline elapsed.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The connection was already closed locally.
    #[error("connection is not open")]
    NotConnected,

    /// The stream violated the framing rules.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    /// Returns `true` for the ways a peer can go away.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::Closed
                | TransportError::ClosedMidFrame { .. }
                | TransportError::NotConnected
        )
    }
}
