//! # ledipc-transport
//!
//! Stream transport for ledipc.  This crate moves opaque payloads between
//! processes; it does not know what a request means.
//!
//! - **`endpoint`** – Where to listen or connect (`unix:///path` or
//!   `tcp://host:port`).
//! - **`connection`** – One open stream plus its receive buffer.  Turns the
//!   byte stream into whole frames and back.
//! - **`server`** – Accept loop with one worker task per connection and a
//!   cooperative shutdown path.
//! - **`client`** – A single request/response session against a server.
//!
//! # For beginners: why a receive buffer?
//!
//! A socket is a *stream*: one `read()` may return half a frame, or one and a
//! half frames.  The connection keeps the leftover bytes between reads and only
//! hands a payload to the caller once the whole frame has arrived.

pub mod client;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod listener;
pub mod server;
pub mod stream;

pub use client::ClientSession;
pub use config::{ConnectionConfig, ServerConfig};
pub use connection::{Connection, ConnectionId, FrameReceiver, FrameSender, READ_CHUNK_SIZE};
pub use endpoint::{Endpoint, EndpointParseError, DEFAULT_SOCKET_PATH};
pub use error::TransportError;
pub use server::{MessageHandler, ResponseSink, Server};
pub use stream::ConnectionStream;

// Re-exported so callers can build a shutdown signal without naming tokio-util.
pub use tokio_util::sync::CancellationToken;
