//! Request and response records carried inside ledipc frames.
//!
//! On the wire a request is a [`RequestRecord`]: an operation tag, a target
//! identifier and an optional state, serialized with `bincode`.  The record is
//! deliberately loose (every field may be absent or defaulted) so that the
//! receiver can tell a *type-unset* request apart from an undecodable one.
//! [`Request`] is the strict, typed view the router works with.
//!
//! A response is always a [`StateResponse`].  A request that failed at the
//! application level (unknown LED, store failure, empty target) still gets a
//! well-formed response, with `state == None` and a non-empty
//! `error_message`.

use std::fmt;
use std::str::FromStr;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::protocol::codec::{ProtocolError, DEFAULT_MAX_FRAME_SIZE};

// ── LED state ─────────────────────────────────────────────────────────────────

/// The two values an LED can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    /// Lower-case name used in user-facing output (`"on"` / `"off"`).
    pub fn as_str(self) -> &'static str {
        match self {
            LedState::On => "on",
            LedState::Off => "off",
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(LedState::On),
            "off" => Ok(LedState::Off),
            other => Err(ProtocolError::MalformedPayload(format!(
                "unknown LED state: {other:?}"
            ))),
        }
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Operation tag stored in a [`RequestRecord`].
///
/// `Unspecified` is what a sender produces when it forgets to set the
/// operation; the router drops such requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationTag {
    #[default]
    Unspecified,
    Update,
    Query,
}

/// Serialized request record as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestRecord {
    pub operation: OperationTag,
    pub target: String,
    pub state: Option<LedState>,
}

/// A typed request, produced from a well-formed [`RequestRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Set `target` to `desired_state`.
    Update {
        target: String,
        desired_state: LedState,
    },
    /// Read the current state of `target`.
    Query { target: String },
}

impl Request {
    /// The target identifier the request refers to.
    pub fn target(&self) -> &str {
        match self {
            Request::Update { target, .. } | Request::Query { target } => target,
        }
    }
}

impl From<&Request> for RequestRecord {
    fn from(request: &Request) -> Self {
        match request {
            Request::Update {
                target,
                desired_state,
            } => RequestRecord {
                operation: OperationTag::Update,
                target: target.clone(),
                state: Some(*desired_state),
            },
            Request::Query { target } => RequestRecord {
                operation: OperationTag::Query,
                target: target.clone(),
                state: None,
            },
        }
    }
}

impl TryFrom<RequestRecord> for Request {
    type Error = ProtocolError;

    fn try_from(record: RequestRecord) -> Result<Self, Self::Error> {
        match record.operation {
            OperationTag::Unspecified => Err(ProtocolError::UnsetOperation),
            OperationTag::Update => {
                let desired_state = record.state.ok_or_else(|| ProtocolError::MissingState {
                    target: record.target.clone(),
                })?;
                Ok(Request::Update {
                    target: record.target,
                    desired_state,
                })
            }
            // A state sent along with a query is ignored.
            OperationTag::Query => Ok(Request::Query {
                target: record.target,
            }),
        }
    }
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// Response to both update and query requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    pub target: String,
    pub state: Option<LedState>,
    /// Empty on success.
    pub error_message: String,
}

impl StateResponse {
    /// A successful response reporting `state` for `target`.
    pub fn success(target: impl Into<String>, state: LedState) -> Self {
        Self {
            target: target.into(),
            state: Some(state),
            error_message: String::new(),
        }
    }

    /// A failed response.  An empty `message` is replaced with a generic one
    /// so that a failure can never be mistaken for a success.
    pub fn failure(target: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error_message = message.into();
        if error_message.is_empty() {
            error_message = "request failed".to_string();
        }
        Self {
            target: target.into(),
            state: None,
            error_message,
        }
    }

    /// Returns `true` when the response carries a state and no error.
    pub fn is_success(&self) -> bool {
        self.state.is_some() && self.error_message.is_empty()
    }
}

impl fmt::Display for StateResponse {
    /// Formats as `<target>=<state>` on success, the error message otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            Some(state) if self.error_message.is_empty() => write!(f, "{}={}", self.target, state),
            _ => f.write_str(&self.error_message),
        }
    }
}

// ── Payload encoding ──────────────────────────────────────────────────────────

/// bincode configuration shared by both directions.
///
/// The size limit is the protocol's payload ceiling, [`DEFAULT_MAX_FRAME_SIZE`]:
/// a hostile length field inside the payload cannot trigger a large
/// allocation, and a connection must never be configured with a larger frame
/// bound.  Trailing bytes are rejected so a payload is exactly one record.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(DEFAULT_MAX_FRAME_SIZE as u64)
}

/// Serializes a request into payload bytes (not yet framed).
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails, e.g.
/// because the target is too long to fit in a frame.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, ProtocolError> {
    encode_request_record(&RequestRecord::from(request))
}

/// Serializes a raw record, valid or not.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails.
pub fn encode_request_record(record: &RequestRecord) -> Result<Vec<u8>, ProtocolError> {
    wire_options()
        .serialize(record)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Deserializes only the loose record, without validating it.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the bytes are not a record.
pub fn decode_request_record(payload: &[u8]) -> Result<RequestRecord, ProtocolError> {
    wire_options()
        .deserialize(payload)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Deserializes payload bytes into a typed [`Request`].
///
/// # Errors
///
/// - [`ProtocolError::MalformedPayload`] – the bytes are not a record.
/// - [`ProtocolError::UnsetOperation`] – the record has no operation tag.
/// - [`ProtocolError::MissingState`] – an update without a desired state.
pub fn decode_request(payload: &[u8]) -> Result<Request, ProtocolError> {
    Request::try_from(decode_request_record(payload)?)
}

/// Serializes a response into payload bytes (not yet framed).
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails.
pub fn encode_response(response: &StateResponse) -> Result<Vec<u8>, ProtocolError> {
    wire_options()
        .serialize(response)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Deserializes payload bytes into a [`StateResponse`].
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the bytes are not a response.
pub fn decode_response(payload: &[u8]) -> Result<StateResponse, ProtocolError> {
    wire_options()
        .deserialize(payload)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
