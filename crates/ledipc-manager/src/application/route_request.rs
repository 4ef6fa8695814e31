//! Request routing: the server-side use case.
//!
//! For every payload a connection delivers, the router:
//!
//! 1. Decodes it into a typed [`Request`].  A payload that is not a request,
//!    or has no operation set, is logged and dropped; the client gets no
//!    response and will run into its receive deadline.
//! 2. Applies it to the [`StateStore`].
//! 3. Sends back exactly one [`StateResponse`].
//!
//! Application-level failures (unknown LED, store error, empty or over-long
//! LED name) are ordinary responses with `state == None` and an error
//! message; they never close the connection.  A response too large for the
//! frame limit is replaced by a short fixed error.

use std::sync::Arc;

use async_trait::async_trait;
use ledipc_core::{decode_request, encode_response, Request, StateResponse};
use ledipc_transport::{MessageHandler, ResponseSink, TransportError};
use tracing::{debug, info, warn};

use crate::infrastructure::state_store::StateStore;

/// Message shown for requests with an empty LED name.
pub const EMPTY_TARGET_MESSAGE: &str = "LED number cannot be empty";

/// Longest LED name accepted, in bytes.  Matches the usual file name limit.
pub const MAX_TARGET_LEN: usize = 255;

/// Message shown for requests whose LED name exceeds [`MAX_TARGET_LEN`].
pub const TARGET_TOO_LONG_MESSAGE: &str = "LED number is too long";

/// Sent instead of a response that would not fit in one frame.
pub const RESPONSE_TOO_LARGE_MESSAGE: &str = "response too large";

/// `target` cut to at most [`MAX_TARGET_LEN`] bytes on a char boundary.
fn truncated(target: &str) -> &str {
    let mut end = target.len().min(MAX_TARGET_LEN);
    while !target.is_char_boundary(end) {
        end -= 1;
    }
    &target[..end]
}

/// Applies requests to a shared [`StateStore`].
#[derive(Clone)]
pub struct RequestRouter {
    store: Arc<dyn StateStore>,
}

impl RequestRouter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Runs one request against the store and builds its response.
    pub fn route(&self, request: &Request) -> StateResponse {
        let target = request.target();
        if target.is_empty() {
            warn!("rejecting request with empty LED name");
            return StateResponse::failure(target, EMPTY_TARGET_MESSAGE);
        }
        if target.len() > MAX_TARGET_LEN {
            warn!(len = target.len(), "rejecting request with over-long LED name");
            return StateResponse::failure(truncated(target), TARGET_TOO_LONG_MESSAGE);
        }

        match request {
            Request::Update {
                target,
                desired_state,
            } => match self.store.write_state(target, *desired_state) {
                Ok(()) => {
                    info!(led = %target, state = %desired_state, "LED updated");
                    StateResponse::success(target.as_str(), *desired_state)
                }
                Err(e) => {
                    warn!(led = %target, "update failed: {e}");
                    StateResponse::failure(target.as_str(), e.to_string())
                }
            },
            Request::Query { target } => match self.store.read_state(target) {
                Ok(state) => {
                    info!(led = %target, state = %state, "LED queried");
                    StateResponse::success(target.as_str(), state)
                }
                Err(e) => {
                    info!(led = %target, "query failed: {e}");
                    StateResponse::failure(target.as_str(), e.to_string())
                }
            },
        }
    }
}

#[async_trait]
impl MessageHandler for RequestRouter {
    async fn handle(
        &self,
        message: Vec<u8>,
        sink: &mut ResponseSink<'_>,
    ) -> Result<(), TransportError> {
        let request = match decode_request(&message) {
            Ok(request) => request,
            Err(e) => {
                warn!(connection = %sink.connection_id(), "dropping request: {e}");
                return Ok(());
            }
        };
        debug!(connection = %sink.connection_id(), ?request, "routing request");

        let response = self.route(&request);
        let refused = match encode_response(&response) {
            Ok(payload) => match sink.send(&payload).await {
                Err(TransportError::Protocol(e)) => e,
                other => return other,
            },
            Err(e) => e,
        };

        // Nothing reached the stream, so the client still gets one answer.
        warn!(connection = %sink.connection_id(), "response not sendable: {refused}");
        let fallback = encode_response(&StateResponse::failure("", RESPONSE_TOO_LARGE_MESSAGE))?;
        sink.send(&fallback).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
