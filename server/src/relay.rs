//! Command classification and rank-ordered fan-out

use crate::connection::ConnectionId;
use crate::registry::RankRegistry;
use log::{debug, warn};
use shared::{Rank, ServerNotice, COMMAND_PREFIX};

/// Classification of a chunk of text received from a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Relayable command; holds the text verbatim, prefix included.
    Command(&'a str),
    Invalid,
}

/// What happened to a message handed to [`RelayEngine::relay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Forwarded to `recipients` more junior clients.
    Relayed { from: Rank, recipients: usize },
    /// Missing prefix; the sender was told the correct syntax.
    Rejected,
    /// Sender is no longer registered (it is mid-disconnect).
    UnknownSender,
}

#[derive(Debug, Clone)]
pub struct RelayEngine {
    prefix: char,
}

impl Default for RelayEngine {
    fn default() -> Self {
        Self::new(COMMAND_PREFIX)
    }
}

impl RelayEngine {
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    pub fn classify<'a>(&self, text: &'a str) -> Inbound<'a> {
        if text.starts_with(self.prefix) {
            Inbound::Command(text)
        } else {
            Inbound::Invalid
        }
    }

    /// Forwards `text` from connection `sender` to every client with a
    /// strictly greater rank, in ascending rank order.
    ///
    /// The sender's rank is read from `registry` at call time, so a promotion
    /// that happened since the last message is honoured. Per-recipient send
    /// failures are swallowed.
    pub fn relay(&self, registry: &RankRegistry, sender: ConnectionId, text: &str) -> RelayOutcome {
        let Some(rank) = registry.rank_of(sender) else {
            debug!("Dropping message from unregistered connection {}", sender);
            return RelayOutcome::UnknownSender;
        };

        let command = match self.classify(text) {
            Inbound::Command(command) => command,
            Inbound::Invalid => {
                if let Some(client) = registry.get(rank) {
                    if let Err(e) = client.handle.send(ServerNotice::InvalidSyntax.to_string()) {
                        debug!("Could not report invalid syntax to rank {}: {}", rank, e);
                    }
                }
                return RelayOutcome::Rejected;
            }
        };

        let mut recipients = 0;
        for client in registry.recipients_after(rank) {
            match client.handle.send(command) {
                Ok(()) => recipients += 1,
                Err(e) => warn!("Relay from rank {} to rank {} failed: {}", rank, client.rank, e),
            }
        }

        debug!("Rank {} relayed {:?} to {} client(s)", rank, command, recipients);
        RelayOutcome::Relayed {
            from: rank,
            recipients,
        }
    }
}
