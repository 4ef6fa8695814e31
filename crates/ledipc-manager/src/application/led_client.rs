//! LedClient: typed `update` / `query` calls against the LED manager.
//!
//! One request is in flight at a time.  A failed call (timeout, disconnect)
//! leaves the transport session closed; the next call opens a fresh one, so
//! an interactive client survives a manager restart.

use async_trait::async_trait;
use ledipc_core::{decode_response, encode_request, LedState, ProtocolError, Request, StateResponse};
use ledipc_transport::{ClientSession, ConnectionConfig, Endpoint, TransportError};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a call produced no [`StateResponse`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// `true` when the manager did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_timeout())
    }
}

/// The two operations an LED client can request.
#[async_trait]
pub trait LedService: Send {
    /// Sets LED `target` to `state`.
    async fn update(&mut self, target: &str, state: LedState) -> Result<StateResponse, ClientError>;

    /// Reads the current state of LED `target`.
    async fn query(&mut self, target: &str) -> Result<StateResponse, ClientError>;
}

/// [`LedService`] over a transport connection.
#[derive(Debug)]
pub struct LedClient {
    endpoint: Endpoint,
    config: ConnectionConfig,
    session: Option<ClientSession>,
}

impl LedClient {
    /// Connects to the manager at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] wrapping
    /// [`TransportError::ConnectFailed`] when no manager is running.
    pub async fn connect(endpoint: Endpoint, config: ConnectionConfig) -> Result<Self, ClientError> {
        let session = ClientSession::connect(&endpoint, config).await?;
        Ok(Self {
            endpoint,
            config,
            session: Some(session),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn open_session(&mut self) -> Result<&mut ClientSession, ClientError> {
        let session = match self.session.take() {
            Some(session) if session.is_open() => session,
            _ => {
                debug!(endpoint = %self.endpoint, "opening new session");
                ClientSession::connect(&self.endpoint, self.config).await?
            }
        };
        Ok(self.session.insert(session))
    }

    /// Sends `request` and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] on connect, send or receive failure
    /// and [`ClientError::Protocol`] when the reply cannot be decoded.
    pub async fn send(&mut self, request: &Request) -> Result<StateResponse, ClientError> {
        let payload = encode_request(request)?;
        let session = self.open_session().await?;
        let reply = session.call(&payload).await?;
        let response = decode_response(&reply)?;
        if response.target != request.target() {
            warn!(
                sent = %request.target(),
                received = %response.target,
                "response names a different LED"
            );
        }
        Ok(response)
    }
}

#[async_trait]
impl LedService for LedClient {
    async fn update(&mut self, target: &str, state: LedState) -> Result<StateResponse, ClientError> {
        self.send(&Request::Update {
            target: target.to_string(),
            desired_state: state,
        })
        .await
    }

    async fn query(&mut self, target: &str) -> Result<StateResponse, ClientError> {
        self.send(&Request::Query {
            target: target.to_string(),
        })
        .await
    }
}
