//! Server loop: accept connections and run one worker per connection.
//!
//! # Lifecycle
//!
//! ```text
//! Server::bind ──► Server::serve ──┬─► accept ─► spawn worker ─┐
//!                                  │       ▲                    │
//!                                  │       └────────────────────┘
//!                                  └─► shutdown.cancelled()
//!                                        ├─ stop accepting
//!                                        ├─ wait `shutdown_grace` for workers
//!                                        ├─ abort the rest
//!                                        └─ remove the Unix socket file
//! ```
//!
//! Workers live in a [`JoinSet`], so the server always knows which of them are
//! still running and can abort them on the way out.  A worker reads frames in
//! order and hands each payload to the [`MessageHandler`]; it stops (and closes
//! its stream) when the peer disconnects, the stream breaks the framing rules,
//! or shutdown is requested.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionId, FrameReceiver, FrameSender};
use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::listener::Listener;

// ── Handler seam ──────────────────────────────────────────────────────────────

/// Application logic plugged into the server.
///
/// The handler sees each payload exactly once, in arrival order for its
/// connection.  It may answer through the sink zero or more times.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handles one received payload.
    ///
    /// Returning an error ends the connection.
    async fn handle(&self, message: Vec<u8>, sink: &mut ResponseSink<'_>)
        -> Result<(), TransportError>;
}

/// The handler's only way back to the client.
///
/// It is bound to one connection and hides everything about it except its id.
pub struct ResponseSink<'a> {
    connection_id: ConnectionId,
    sender: &'a mut dyn FrameSender,
    sent: usize,
}

impl<'a> ResponseSink<'a> {
    pub fn new(connection_id: ConnectionId, sender: &'a mut dyn FrameSender) -> Self {
        Self {
            connection_id,
            sender,
            sent: 0,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Sends `payload` as one frame on the owning connection.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.sender.send(payload).await?;
        self.sent += 1;
        Ok(())
    }

    /// Number of frames sent through this sink.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

/// A bound listener waiting to be served.
#[derive(Debug)]
pub struct Server {
    listener: Listener,
    endpoint: Endpoint,
    config: ServerConfig,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// For Unix endpoints a stale socket file is replaced, while a live one is
    /// reported as [`TransportError::AddressInUse`].
    ///
    /// # Errors
    ///
    /// See [`Listener::bind`].
    pub async fn bind(endpoint: Endpoint, config: ServerConfig) -> Result<Self, TransportError> {
        let listener = Listener::bind(&endpoint).await?;
        // Resolve TCP port 0 to the real port so logs and callers see it.
        let endpoint = listener.local_endpoint().unwrap_or(endpoint);
        info!(endpoint = %endpoint, "listening");
        Ok(Self {
            listener,
            endpoint,
            config,
        })
    }

    /// The endpoint clients should connect to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Runs the accept loop until `shutdown` is cancelled.
    ///
    /// Accept failures (for example running out of file descriptors) are
    /// logged and retried after `accept_backoff`; they never end the loop.
    /// When this returns, every worker has finished or been aborted and the
    /// Unix socket file (if any) has been removed.
    pub async fn serve<H>(self, handler: Arc<H>, shutdown: CancellationToken)
    where
        H: MessageHandler,
    {
        let Server {
            listener,
            endpoint,
            config,
        } = self;
        let mut workers: JoinSet<()> = JoinSet::new();
        let mut next_id: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(endpoint = %endpoint, "shutdown requested; no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        let id = ConnectionId::new(next_id);
                        info!(connection = %id, peer = %peer, "client connected");
                        let connection = Connection::new(id, stream, config.connection);
                        workers.spawn(run_worker(
                            connection,
                            Arc::clone(&handler),
                            shutdown.child_token(),
                        ));
                    }
                    Err(e) => {
                        error!(endpoint = %endpoint, "accept failed: {e}");
                        if !back_off(config.accept_backoff, &shutdown).await {
                            info!(endpoint = %endpoint, "shutdown requested; no longer accepting");
                            break;
                        }
                    }
                },
                // Reap finished workers so the registry does not grow without bound.
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    log_worker_exit(joined);
                }
            }
        }

        drain_workers(&mut workers, config).await;
        // Dropping the listener removes the Unix socket file.
        drop(listener);
        info!(endpoint = %endpoint, "server stopped");
    }
}

/// Sleeps for `delay` unless `shutdown` fires first.
///
/// Returns `false` when cut short by shutdown.
async fn back_off(delay: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Waits up to the grace period for workers, then aborts the stragglers.
async fn drain_workers(workers: &mut JoinSet<()>, config: ServerConfig) {
    if workers.is_empty() {
        return;
    }
    debug!(count = workers.len(), "waiting for connection workers to finish");

    let drained = tokio::time::timeout(config.shutdown_grace, async {
        while let Some(joined) = workers.join_next().await {
            log_worker_exit(joined);
        }
    })
    .await;

    if drained.is_err() {
        warn!(
            remaining = workers.len(),
            "workers still running after {:?}; aborting",
            config.shutdown_grace
        );
        workers.abort_all();
        while workers.join_next().await.is_some() {}
    }
}

fn log_worker_exit(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("connection worker panicked: {e}");
        }
    }
}

/// Serves one connection until it ends.
async fn run_worker<S, H>(mut connection: Connection<S>, handler: Arc<H>, shutdown: CancellationToken)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
    H: MessageHandler,
{
    let id = connection.id();

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(connection = %id, "worker stopping for shutdown");
                break;
            }
            received = connection.receive() => received,
        };

        match received {
            Ok(message) => {
                debug!(connection = %id, len = message.len(), "message received");
                let mut sink = ResponseSink::new(id, &mut connection);
                if let Err(e) = handler.handle(message, &mut sink).await {
                    warn!(connection = %id, "handler failed, closing connection: {e}");
                    break;
                }
            }
            Err(TransportError::Closed) => {
                info!(connection = %id, "client disconnected");
                break;
            }
            Err(e) => {
                warn!(connection = %id, "closing connection: {e}");
                break;
            }
        }
    }

    connection.close().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
