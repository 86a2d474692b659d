//! TCP server for case conversion requests.
//!
//! A single task accepts connections and hands each one to its own spawned
//! task. That task runs one exchange (read, convert, write) and drops the
//! stream. Errors and panics stay inside the task; the accept loop only
//! logs accept failures and keeps going.

use crate::config::{Config, ConfigError};
use crate::net::{self, NetError};
use crate::protocol::{read_request, write_all, ExchangeError};
use crate::transform::apply_case;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Net(#[from] NetError),
}

/// Server instance
pub struct Server {
    listener: TcpListener,
    buffer_size: usize,
}

impl Server {
    /// Bind and listen on the configured input address.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let address = config.listen_address()?;
        let port = config.options.in_port;
        let listener = net::listen(address, port, config.backlog)?;

        debug!(
            address,
            port,
            backlog = config.backlog,
            buffer_size = config.buffer_size,
            "Listening socket bound"
        );

        Ok(Server {
            listener,
            buffer_size: config.buffer_size,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub async fn run(&self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) => {
                    error!(error = %e, "Failed to accept client connection");
                }
            }
        }
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Exchanges already in flight keep running on their own tasks.
    pub async fn run_until(&self, shutdown: impl Future) {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => {
                info!("Shutting down");
            }
        }
    }

    /// Move the accepted stream into its own task.
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        debug!(%peer, "New connection");
        let buffer_size = self.buffer_size;

        tokio::spawn(async move {
            let mut stream = stream;
            match handle_connection(&mut stream, buffer_size).await {
                Ok(bytes) => debug!(%peer, bytes, "Response written"),
                Err(ExchangeError::Closed) => debug!(%peer, "Closed without a request"),
                Err(e) if e.is_format() => warn!(%peer, error = %e, "Invalid request"),
                Err(e) => warn!(%peer, error = %e, "Connection error"),
            }
        });
    }
}

/// Run one request/response exchange on `stream`.
///
/// Returns the number of response bytes written. The stream is not closed
/// here; the caller owns it.
pub async fn handle_connection<S>(stream: &mut S, buffer_size: usize) -> Result<usize, ExchangeError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let mut request = read_request(stream, buffer_size).await?;
    info!(
        mode = %request.mode,
        message = %String::from_utf8_lossy(&request.message),
        "Message received from client"
    );

    apply_case(&mut request.message, request.mode);
    write_all(stream, &request.message).await
}
