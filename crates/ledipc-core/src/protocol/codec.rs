//! Length-prefixed frame codec for the ledipc wire protocol.
//!
//! Wire format:
//! ```text
//! [payload_len:4][payload:N]
//! ```
//! `payload_len` is a big-endian `u32`.  A frame with `payload_len == 0` or
//! `payload_len > max_frame_size` is a protocol violation: the receiver must
//! close the connection instead of trying to resynchronise, because there is
//! no way to find the next frame boundary in a corrupted stream.
//!
//! The codec knows nothing about what the payload means; see
//! [`crate::protocol::messages`] for the request/response records.

use thiserror::Error;

/// Size of the big-endian length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound for a single frame payload.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4096;

/// Errors that can occur while framing or interpreting a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer does not yet hold a complete frame; read more bytes and retry.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The frame header declares a zero-length payload.
    #[error("frame declares an empty payload")]
    EmptyFrame,

    /// The frame header declares a payload larger than the configured maximum.
    #[error("frame of {declared} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge { declared: usize, max: usize },

    /// The payload bytes could not be deserialized into a record.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The request record carries no operation tag.
    #[error("request has no operation set")]
    UnsetOperation,

    /// An update request arrived without the desired state.
    #[error("update request for target '{target}' carries no state")]
    MissingState { target: String },
}

impl ProtocolError {
    /// Returns `true` when the error only means "wait for more bytes".
    ///
    /// Every other variant is a real violation.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ProtocolError::InsufficientData { .. })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Wraps `payload` in a frame: a 4-byte big-endian length followed by the bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::EmptyFrame`] for an empty payload and
/// [`ProtocolError::FrameTooLarge`] when `payload` exceeds `max_frame_size`.
/// Both would be rejected by the receiving side, so they are refused here
/// rather than put on the wire.
///
/// # Examples
///
/// ```rust
/// use ledipc_core::protocol::codec::{decode_frame, encode_frame, DEFAULT_MAX_FRAME_SIZE};
///
/// let bytes = encode_frame(b"hello", DEFAULT_MAX_FRAME_SIZE).unwrap();
/// assert_eq!(&bytes[..4], &[0, 0, 0, 5]);
/// let (payload, consumed) = decode_frame(&bytes, DEFAULT_MAX_FRAME_SIZE).unwrap();
/// assert_eq!(payload, b"hello");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_frame(payload: &[u8], max_frame_size: usize) -> Result<Vec<u8>, ProtocolError> {
    if payload.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    let too_large = ProtocolError::FrameTooLarge {
        declared: payload.len(),
        max: max_frame_size,
    };
    if payload.len() > max_frame_size {
        return Err(too_large);
    }
    let payload_len = u32::try_from(payload.len()).map_err(|_| too_large)?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes the first complete frame at the beginning of `bytes`.
///
/// Returns the payload slice and the total number of bytes consumed
/// (prefix + payload), so the caller can drain exactly one frame from its
/// receive buffer.  Bytes belonging to a following frame are never touched.
///
/// The length is validated as soon as the 4-byte prefix is available, so an
/// oversized or empty declaration is reported without waiting for a body
/// that may never come.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] – the frame is not complete yet.
/// - [`ProtocolError::EmptyFrame`] / [`ProtocolError::FrameTooLarge`] – the
///   declared length is invalid; the connection must be closed.
pub fn decode_frame(bytes: &[u8], max_frame_size: usize) -> Result<(&[u8], usize), ProtocolError> {
    if bytes.len() < LENGTH_PREFIX_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: LENGTH_PREFIX_SIZE,
            available: bytes.len(),
        });
    }

    let payload_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if payload_len == 0 {
        return Err(ProtocolError::EmptyFrame);
    }
    if payload_len > max_frame_size {
        return Err(ProtocolError::FrameTooLarge {
            declared: payload_len,
            max: max_frame_size,
        });
    }

    let total_needed = LENGTH_PREFIX_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    Ok((&bytes[LENGTH_PREFIX_SIZE..total_needed], total_needed))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
