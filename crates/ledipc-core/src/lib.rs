//! # ledipc-core
//!
//! Shared library for ledipc containing the wire protocol: the frame codec
//! and the request/response records exchanged between the LED manager and
//! its clients.
//!
//! This crate is used by both the transport layer and the manager binary.
//! It has zero dependencies on sockets, async runtimes, or the file system.
//!
//! # Architecture overview
//!
//! ledipc is a tiny inter-process-communication layer.  A long-lived server
//! (the *LED manager*) owns a set of on/off device states and clients send it
//! requests over a local socket:
//!
//! - **`protocol::codec`** – How bytes travel over a stream.  Every message is
//!   a *frame*: a 4-byte big-endian length followed by exactly that many
//!   payload bytes.
//!
//! - **`protocol::messages`** – What the payload bytes mean.  Requests and
//!   responses are plain records serialized with `bincode`, and are converted
//!   into typed Rust enums on the receiving side.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `ledipc_core::decode_frame` instead of `ledipc_core::protocol::codec::decode_frame`.
pub use protocol::codec::{
    decode_frame, encode_frame, ProtocolError, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE,
};
pub use protocol::messages::{
    decode_request, decode_request_record, decode_response, encode_request, encode_request_record,
    encode_response, LedState, OperationTag, Request, RequestRecord, StateResponse,
};
