//! Listening sockets and stale Unix socket handling.
//!
//! A Unix socket file outlives the process that created it if that process
//! crashes.  Before binding, an existing path is checked:
//!
//! 1. Not a socket at all → refuse ([`TransportError::NotASocket`]); we never
//!    delete a regular file on someone's behalf.
//! 2. A connect succeeds → another server is alive
//!    ([`TransportError::AddressInUse`]).
//! 3. The connect is refused → the file is stale and gets removed.
//!
//! The listener removes its own socket file when dropped.

use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::stream::ConnectionStream;

/// A bound listener for either socket family.
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixSocketListener),
}

/// A Unix listener that owns (and finally removes) its socket file.
#[cfg(unix)]
#[derive(Debug)]
pub struct UnixSocketListener {
    listener: UnixListener,
    path: PathBuf,
}

impl Listener {
    /// Binds a listener at `endpoint`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::AddressInUse`] – a live server owns the Unix path.
    /// - [`TransportError::NotASocket`] – the Unix path is some other file.
    /// - [`TransportError::Bind`] – the OS refused the bind.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self, TransportError> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                let listener = TcpListener::bind((host.as_str(), *port))
                    .await
                    .map_err(|source| TransportError::Bind {
                        endpoint: endpoint.to_string(),
                        source,
                    })?;
                Ok(Listener::Tcp(listener))
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => {
                let listener = bind_unix(path)?;
                Ok(Listener::Unix(UnixSocketListener {
                    listener,
                    path: path.clone(),
                }))
            }
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => Err(TransportError::Bind {
                endpoint: endpoint.to_string(),
                source: io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix domain sockets are not available on this platform",
                ),
            }),
        }
    }

    /// Waits for the next inbound connection.
    ///
    /// Returns the stream and a printable description of the peer.
    pub async fn accept(&self) -> io::Result<(ConnectionStream, String)> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                stream.set_nodelay(true)?;
                Ok((ConnectionStream::Tcp(stream), peer.to_string()))
            }
            #[cfg(unix)]
            Listener::Unix(unix) => {
                let (stream, _peer) = unix.listener.accept().await?;
                // Unix clients are normally unnamed; report the socket instead.
                Ok((ConnectionStream::Unix(stream), unix.path.display().to_string()))
            }
        }
    }

    /// The endpoint actually bound.  For TCP port 0 this carries the port the
    /// OS picked.
    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        match self {
            Listener::Tcp(listener) => {
                let addr = listener.local_addr()?;
                Ok(Endpoint::tcp(addr.ip().to_string(), addr.port()))
            }
            #[cfg(unix)]
            Listener::Unix(unix) => Ok(Endpoint::unix(unix.path.clone())),
        }
    }
}

#[cfg(unix)]
impl Drop for UnixSocketListener {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed unix socket file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to remove unix socket file: {e}"),
        }
    }
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, TransportError> {
    let shown = || path.display().to_string();
    let bind_error = |source| TransportError::Bind {
        endpoint: Endpoint::unix(path).to_string(),
        source,
    };

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if !metadata.file_type().is_socket() {
                return Err(TransportError::NotASocket { path: shown() });
            }
            match std::os::unix::net::UnixStream::connect(path) {
                Ok(_stream) => {
                    return Err(TransportError::AddressInUse {
                        endpoint: Endpoint::unix(path).to_string(),
                    });
                }
                Err(e)
                    if e.kind() == io::ErrorKind::ConnectionRefused
                        || e.kind() == io::ErrorKind::NotFound =>
                {
                    info!(path = %shown(), "removing stale unix socket");
                    fs::remove_file(path).map_err(bind_error)?;
                }
                Err(e) => return Err(bind_error(e)),
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(bind_error(e)),
    }

    UnixListener::bind(path).map_err(bind_error)
}
