//! Socket plumbing shared by the server and the client.
//!
//! - `resolve`: literal IPv4/IPv6 address + port to a `SocketAddr`
//! - `socket`: client connect, listening socket, single accept
//!
//! Every socket is an owned value. Dropping it closes the descriptor, so
//! each error branch releases whatever was opened before it.

mod resolve;
mod socket;

pub use resolve::resolve;
pub use socket::{accept_once, connect_client, listen};

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while resolving an endpoint or building a socket.
#[derive(Debug, Error)]
pub enum NetError {
    /// The address is neither a literal IPv4 nor a literal IPv6 address.
    #[error("{address} is not an IPv4 or an IPv6 address")]
    AddressFamily { address: String },

    /// Creating the socket (or registering it with the runtime) failed.
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),
}
