//! # Rank Relay Server Library
//!
//! This library provides the server side of a rank-ordered command relay.
//! Clients connect over TCP and are assigned a numeric rank in connection
//! order, 0 being the most senior. A client may send commands, and each
//! command is relayed verbatim to every client of strictly lower privilege
//! (a higher rank number).
//!
//! ## Core Responsibilities
//!
//! ### Admission
//! New connections receive the next free rank until the configured capacity
//! is reached. Further connections are told the server is full and closed.
//!
//! ### Relay
//! Text starting with `/` is a command and is forwarded to every client ranked
//! below the sender. Anything else is answered with a syntax hint and dropped.
//!
//! ### Promotion
//! When a client disconnects, every client ranked below it moves up by one so
//! that live ranks always form the contiguous range `0..n`.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The acceptor runs on its own task. Each admitted connection gets a receive
//! task and a writer task, the latter fed through an unbounded channel so a
//! slow or dead peer never blocks anyone else.
//!
//! ### Single Lock
//! The [`registry::RankRegistry`] sits behind one `RwLock`. Admission and
//! removal (including the promotion pass) take the write side; relay and
//! broadcast fan-out take the read side.
//!
//! ## Module Organization
//!
//! - `connection`: client handles, the writer task and the receive step
//! - `registry`: rank assignment, capacity, removal and promotion
//! - `relay`: command classification and rank-filtered fan-out
//! - `network`: the accept loop and per-connection lifecycle
//! - `config`: startup parameters
//! - `error`: the shared error type
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("0.0.0.0:5000".parse()?, 3)?;
//!     let server = Server::bind(&config).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod network;
pub mod registry;
pub mod relay;
