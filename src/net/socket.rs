//! Socket factory.
//!
//! Three roles share the resolver:
//! - `connect_client`: stream socket connected to a server
//! - `listen`: bound, listening socket for a long-lived accept loop
//! - `accept_once`: listen, accept a single connection, close the listener
//!
//! Listening sockets are built with `socket2` so the backlog is explicit,
//! then handed to tokio. `listen` and `accept_once` must run inside a tokio
//! runtime.

use super::{resolve, NetError};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::debug;

/// Connect a stream socket of the resolved family to `address:port`.
///
/// On a failed connect the socket is dropped before the error is returned.
pub async fn connect_client(address: &str, port: u16) -> Result<TcpStream, NetError> {
    let addr = resolve(address, port)?;

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(NetError::Socket)?;

    let stream = socket
        .connect(addr)
        .await
        .map_err(|source| NetError::Connect { addr, source })?;

    debug!(%addr, "Connected");
    Ok(stream)
}

/// Create, bind and listen. Returns the listening socket; nothing is accepted.
pub fn listen(address: &str, port: u16, backlog: i32) -> Result<TcpListener, NetError> {
    let addr = resolve(address, port)?;

    let socket = Socket::new(
        match addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        },
        Type::STREAM,
        Some(Protocol::TCP),
    )
    .map_err(NetError::Socket)?;

    socket.set_reuse_address(true).map_err(NetError::Socket)?;
    socket.set_nonblocking(true).map_err(NetError::Socket)?;
    socket
        .bind(&addr.into())
        .map_err(|source| NetError::Bind { addr, source })?;
    socket
        .listen(backlog)
        .map_err(|source| NetError::Listen { addr, source })?;

    TcpListener::from_std(socket.into()).map_err(NetError::Socket)
}

/// Listen on `address:port`, accept exactly one connection, then close the
/// listening socket whatever the accept outcome.
pub async fn accept_once(address: &str, port: u16, backlog: i32) -> Result<TcpStream, NetError> {
    let listener = listen(address, port, backlog)?;
    let accepted = listener.accept().await;
    drop(listener);

    let (stream, peer) = accepted.map_err(NetError::Accept)?;
    debug!(%peer, "Accepted single connection");
    Ok(stream)
}
