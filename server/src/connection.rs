//! Per-connection plumbing between a TCP stream and the rank registry
//!
//! Every admitted stream is split in two. The write half is owned by a
//! dedicated writer task fed through an unbounded channel, so anything holding
//! a [`ClientHandle`] can queue text without awaiting the socket. The read half
//! stays with the connection's receive loop, which turns each read into a
//! [`ReceiveEvent`] instead of surfacing raw I/O errors.

use crate::error::RelayError;
use log::debug;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Server-assigned identity of a connection, stable across promotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Instructions consumed by a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Outcome of a single read on a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveEvent {
    Data(String),
    /// The peer closed its side (zero-length read).
    Closed,
    /// The read failed, typically a reset.
    Error(io::ErrorKind),
}

/// Sending side of a client connection as seen by the registry
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, addr: SocketAddr, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { id, addr, tx }
    }

    /// Queues text for delivery. Fails only once the writer task has exited.
    pub fn send(&self, text: impl Into<String>) -> Result<(), RelayError> {
        self.tx
            .send(Outbound::Text(text.into()))
            .map_err(|_| RelayError::PeerUnreachable {
                connection: self.id,
            })
    }

    /// Asks the writer task to shut the stream down. Safe to call repeatedly.
    pub fn close(&self) {
        if self.tx.send(Outbound::Close).is_err() {
            debug!("Connection {} already closed", self.id);
        }
    }
}

/// Drains `rx` into `writer` until a close is requested, the channel is
/// dropped, or a write fails.
///
/// There is no write timeout. A peer that stops reading stalls only its own
/// writer, and its queue keeps growing until the peer disconnects.
pub async fn run_writer<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        match message {
            Outbound::Text(text) => {
                if let Err(e) = writer.write_all(text.as_bytes()).await {
                    debug!("Write failed, stopping writer: {}", e);
                    break;
                }
            }
            Outbound::Close => break,
        }
    }

    let _ = writer.shutdown().await;
}

/// Reads one chunk from `reader` and classifies it.
pub async fn receive<R>(reader: &mut R, buffer: &mut [u8]) -> ReceiveEvent
where
    R: AsyncRead + Unpin,
{
    match reader.read(buffer).await {
        Ok(0) => ReceiveEvent::Closed,
        Ok(len) => ReceiveEvent::Data(String::from_utf8_lossy(&buffer[..len]).into_owned()),
        Err(e) => ReceiveEvent::Error(e.kind()),
    }
}
