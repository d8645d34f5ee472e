//! Error type shared by the registry, relay and network layers.

use crate::connection::ConnectionId;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Configured capacity is below the two-client minimum.
    #[error("max_clients must be at least {minimum}, got {requested}")]
    InvalidCapacity { requested: i64, minimum: usize },

    #[error("server is full ({capacity} clients)")]
    CapacityExceeded { capacity: usize },

    /// The writer task for a connection has already gone away.
    #[error("connection {connection} is unreachable")]
    PeerUnreachable { connection: ConnectionId },

    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
