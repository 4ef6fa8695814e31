//! A single framed connection.
//!
//! [`Connection`] owns one stream and a receive buffer.  It exposes two
//! capabilities, [`FrameSender`] and [`FrameReceiver`], so that code which only
//! needs to send (or only to receive) can be tested against a hand-written
//! double instead of a socket.
//!
//! # Failure policy
//!
//! Any error on `receive` or on the write half of `send` closes the
//! connection: after a timeout or a framing violation there is no way to know
//! where the next frame starts, so the stream cannot be reused.  Subsequent
//! calls return [`TransportError::NotConnected`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use ledipc_core::{decode_frame, encode_frame};

use crate::config::ConnectionConfig;
use crate::error::TransportError;
use crate::stream::ConnectionStream;

/// Bytes requested from the stream per read.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Identifies a connection in logs and to message handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Sends one payload as one frame.
#[async_trait]
pub trait FrameSender: Send {
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

/// Receives the next complete frame payload.
#[async_trait]
pub trait FrameReceiver: Send {
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError>;
}

// ── Connection ────────────────────────────────────────────────────────────────

/// A stream plus the bytes received so far that do not yet form a frame.
///
/// Generic over the stream so tests can substitute in-memory streams; the
/// default is the socket stream used by the server and clients.
pub struct Connection<S = ConnectionStream> {
    id: ConnectionId,
    stream: Option<S>,
    recv_buf: Vec<u8>,
    config: ConnectionConfig,
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.stream.is_some())
            .field("buffered", &self.recv_buf.len())
            .finish()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(id: ConnectionId, stream: S, config: ConnectionConfig) -> Self {
        Self {
            id,
            stream: Some(stream),
            recv_buf: Vec::with_capacity(READ_CHUNK_SIZE),
            config,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Shuts the stream down and releases it.  Calling it again does nothing.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                // The peer may already be gone; nothing left to do either way.
                trace!(connection = %self.id, "shutdown after close failed: {e}");
            }
            self.recv_buf.clear();
            debug!(connection = %self.id, "connection closed");
        }
    }

    /// Reads until the buffer holds one whole frame and returns its payload.
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        let max_frame_size = self.config.max_frame_size;
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            // A previous read may already have delivered the next frame.
            match decode_frame(&self.recv_buf, max_frame_size) {
                Ok((payload, consumed)) => {
                    let payload = payload.to_vec();
                    self.recv_buf.drain(..consumed);
                    trace!(connection = %self.id, len = payload.len(), "frame received");
                    return Ok(payload);
                }
                Err(e) if e.is_incomplete() => {}
                Err(e) => return Err(TransportError::Protocol(e)),
            }

            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(if self.recv_buf.is_empty() {
                    TransportError::Closed
                } else {
                    TransportError::ClosedMidFrame {
                        buffered: self.recv_buf.len(),
                    }
                });
            }
            self.recv_buf.extend_from_slice(&chunk[..n]);
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(frame).await?;
        stream.flush().await?;
        Ok(())
    }
}

/// Runs `operation` under an optional deadline.
async fn with_deadline<T, F>(deadline: Option<Duration>, operation: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .unwrap_or(Err(TransportError::Timeout(limit))),
        None => operation.await,
    }
}

#[async_trait]
impl<S> FrameSender for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotConnected);
        }
        // Refused before anything reaches the stream, so the connection stays usable.
        let frame = encode_frame(payload, self.config.max_frame_size)?;

        let deadline = self.config.send_timeout;
        let result = with_deadline(deadline, self.write_frame(&frame)).await;
        if let Err(e) = &result {
            debug!(connection = %self.id, "send failed, closing: {e}");
            self.close().await;
        }
        result
    }
}

#[async_trait]
impl<S> FrameReceiver for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotConnected);
        }

        let deadline = self.config.receive_timeout;
        let result = with_deadline(deadline, self.read_frame()).await;
        if let Err(e) = &result {
            debug!(connection = %self.id, "receive failed, closing: {e}");
            self.close().await;
        }
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
