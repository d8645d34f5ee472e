use std::fmt;

/// Character every relayable command must start with.
pub const COMMAND_PREFIX: char = '/';
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_CLIENTS: usize = 3;
pub const MIN_CLIENTS: usize = 2;
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Position of a client in the server's privilege order. 0 is the most senior.
pub type Rank = usize;

/// Status text the server sends to clients.
///
/// The wire carries these as plain UTF-8 with no framing, so the `Display`
/// output is the exact byte content put on the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNotice {
    /// Sent to a newly admitted client.
    Welcome { rank: Rank },
    /// Sent to every other client when someone is admitted.
    Joined { rank: Rank },
    /// Sent to a connection refused at capacity, right before it is closed.
    ServerFull,
    /// Sent back to a client whose message lacks the command prefix.
    InvalidSyntax,
    /// Sent to the remaining clients when the client at `rank` leaves.
    Departed { rank: Rank },
    /// Sent to a client whose rank was decremented to fill a gap.
    Promoted { rank: Rank },
}

impl fmt::Display for ServerNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerNotice::Welcome { rank } => write!(f, "You are rank number {}", rank),
            ServerNotice::Joined { rank } => write!(
                f,
                "A new client with rank number {} has connected to the server",
                rank
            ),
            ServerNotice::ServerFull => write!(f, "Server is currently full, try again later"),
            ServerNotice::InvalidSyntax => write!(
                f,
                "Invalid command syntax. Prefix your command with \"{}\" and try again",
                COMMAND_PREFIX
            ),
            ServerNotice::Departed { rank } => {
                write!(f, "Client with rank {} has disconnected", rank)
            }
            ServerNotice::Promoted { rank } => {
                write!(f, "You have been promoted to rank {}", rank)
            }
        }
    }
}

/// How a client interprets a chunk of text received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming<'a> {
    /// A relayed command from a more senior client, prefix stripped.
    Command(&'a str),
    /// A server notice or any other text, shown as-is.
    Notice(&'a str),
}

impl<'a> Incoming<'a> {
    pub fn parse(text: &'a str) -> Self {
        match text.strip_prefix(COMMAND_PREFIX) {
            Some(payload) => Incoming::Command(payload),
            None => Incoming::Notice(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_text_matches_wire_format() {
        assert_eq!(
            ServerNotice::Welcome { rank: 0 }.to_string(),
            "You are rank number 0"
        );
        assert_eq!(
            ServerNotice::Joined { rank: 2 }.to_string(),
            "A new client with rank number 2 has connected to the server"
        );
        assert_eq!(
            ServerNotice::ServerFull.to_string(),
            "Server is currently full, try again later"
        );
        assert_eq!(
            ServerNotice::InvalidSyntax.to_string(),
            "Invalid command syntax. Prefix your command with \"/\" and try again"
        );
        assert_eq!(
            ServerNotice::Departed { rank: 1 }.to_string(),
            "Client with rank 1 has disconnected"
        );
        assert_eq!(
            ServerNotice::Promoted { rank: 3 }.to_string(),
            "You have been promoted to rank 3"
        );
    }

    #[test]
    fn test_incoming_command_strips_prefix() {
        assert_eq!(Incoming::parse("/reboot"), Incoming::Command("reboot"));
        assert_eq!(Incoming::parse("/"), Incoming::Command(""));
    }

    #[test]
    fn test_incoming_notice_passthrough() {
        let text = "You are rank number 1";
        assert_eq!(Incoming::parse(text), Incoming::Notice(text));
        assert_eq!(Incoming::parse(" /x"), Incoming::Notice(" /x"));
    }

    #[test]
    fn test_defaults_respect_minimum() {
        assert!(DEFAULT_MAX_CLIENTS >= MIN_CLIENTS);
    }
}
