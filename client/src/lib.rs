//! # Rank Relay Client Library
//!
//! Console client for the rank relay server. It connects over TCP, prints
//! everything the server sends, and forwards each line typed by the user.
//!
//! Text arriving with the command prefix was relayed from a more senior
//! client and is shown as a command to execute; everything else is a status
//! notice from the server and is shown verbatim.
//!
//! ## Module Organization
//!
//! - `network`: connection, the receive task and the input loop

pub mod network;
