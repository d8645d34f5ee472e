//! Server network layer: accept loop, admission and per-connection receive loops

use crate::config::ServerConfig;
use crate::connection::{receive, run_writer, ClientHandle, ConnectionId, ReceiveEvent};
use crate::error::RelayError;
use crate::registry::RankRegistry;
use crate::relay::{RelayEngine, RelayOutcome};
use log::{debug, error, info, warn};
use shared::{Rank, ServerNotice, RECV_BUFFER_SIZE};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};

/// Lifecycle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Admitted,
    Active,
    Closed,
}

/// Tracks one connection's lifecycle and guards against closing it twice.
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    state: ConnectionState,
}

impl Session {
    pub fn new(id: ConnectionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn admitted(&mut self) {
        self.advance(ConnectionState::Connecting, ConnectionState::Admitted);
    }

    pub fn activate(&mut self) {
        self.advance(ConnectionState::Admitted, ConnectionState::Active);
    }

    /// Moves to `Closed`. Returns false if the session was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Closed;
        true
    }

    fn advance(&mut self, from: ConnectionState, to: ConnectionState) {
        if self.state == from {
            self.state = to;
        } else {
            warn!(
                "Connection {} cannot move from {:?} to {:?}",
                self.id, self.state, to
            );
        }
    }
}

/// Rank relay server
pub struct Server {
    listener: TcpListener,
    registry: Arc<RwLock<RankRegistry>>,
    engine: RelayEngine,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Validates `config` and binds the listener.
    ///
    /// The capacity check runs first, so a bad configuration never opens a
    /// socket.
    pub async fn bind(config: &ServerConfig) -> Result<Self, RelayError> {
        let registry = RankRegistry::new(config.max_clients)?;

        let listener = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| RelayError::Bind {
                addr: config.bind_address,
                source,
            })?;

        info!(
            "Listening for client connections on port {}",
            config.bind_address.port()
        );
        info!("Maximum allowed clients: {}", config.max_clients);

        Ok(Server {
            listener,
            registry: Arc::new(RwLock::new(registry)),
            engine: RelayEngine::default(),
            next_connection_id: AtomicU64::new(0),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared registry, mainly for inspection.
    pub fn registry(&self) -> Arc<RwLock<RankRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections forever.
    pub async fn run(self) {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
                    self.handle_new_connection(stream, Session::new(id, addr))
                        .await;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Admits or rejects a freshly accepted stream and starts its tasks.
    async fn handle_new_connection(&self, stream: TcpStream, mut session: Session) {
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(writer, rx));

        let handle = ClientHandle::new(session.id, session.addr, tx);

        let admitted = {
            let mut registry = self.registry.write().await;
            match registry.admit(handle.clone()) {
                Ok(rank) => {
                    session.admitted();
                    if let Err(e) = handle.send(ServerNotice::Welcome { rank }.to_string()) {
                        debug!("Could not greet rank {}: {}", rank, e);
                    }
                    registry.broadcast(
                        &ServerNotice::Joined { rank }.to_string(),
                        Some(session.id),
                    );
                    Some(rank)
                }
                Err(e) => {
                    debug!("Admission failed: {}", e);
                    None
                }
            }
        };

        let Some(rank) = admitted else {
            if let Err(e) = handle.send(ServerNotice::ServerFull.to_string()) {
                debug!("Could not tell {} the server is full: {}", session.addr, e);
            }
            handle.close();
            session.close();
            info!(
                "Connection from {} was rejected. Server is full",
                session.addr.ip()
            );
            return;
        };

        info!(
            "Accepted connection from {}. Assigned rank {}",
            session.addr.ip(),
            rank
        );

        session.activate();
        tokio::spawn(handle_client(
            Arc::clone(&self.registry),
            self.engine.clone(),
            reader,
            session,
        ));
    }
}

/// Receive loop for one admitted connection.
async fn handle_client(
    registry: Arc<RwLock<RankRegistry>>,
    engine: RelayEngine,
    mut reader: OwnedReadHalf,
    mut session: Session,
) {
    let mut buffer = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        match receive(&mut reader, &mut buffer).await {
            ReceiveEvent::Data(text) => {
                let registry = registry.read().await;
                if let RelayOutcome::UnknownSender = engine.relay(&registry, session.id, &text) {
                    break;
                }
            }
            ReceiveEvent::Closed => {
                debug!("Connection {} closed by peer", session.id);
                break;
            }
            ReceiveEvent::Error(kind) => {
                debug!("Connection {} failed: {:?}", session.id, kind);
                break;
            }
        }
    }

    close_session(&registry, &mut session).await;
}

/// Removes a session's client from the registry exactly once.
async fn close_session(registry: &RwLock<RankRegistry>, session: &mut Session) -> Option<Rank> {
    if !session.close() {
        return None;
    }

    let mut registry = registry.write().await;
    registry.remove_connection(session.id)
}
