//! Startup configuration for the relay server

use crate::error::RelayError;
use log::warn;
use shared::{DEFAULT_MAX_CLIENTS, DEFAULT_PORT, MIN_CLIENTS};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }
}

impl ServerConfig {
    pub fn new(bind_address: SocketAddr, max_clients: usize) -> Result<Self, RelayError> {
        if max_clients < MIN_CLIENTS {
            return Err(RelayError::InvalidCapacity {
                requested: max_clients as i64,
                minimum: MIN_CLIENTS,
            });
        }

        Ok(Self {
            bind_address,
            max_clients,
        })
    }
}

/// Interprets the raw max-clients argument.
///
/// Anything that is not an integer, including a missing argument, falls back
/// to the default. Any integer below the minimum, negative ones included, is
/// a configuration error.
pub fn resolve_max_clients(raw: Option<&str>) -> Result<usize, RelayError> {
    let Some(value) = raw else {
        return Ok(DEFAULT_MAX_CLIENTS);
    };

    let requested: i64 = match value.trim().parse() {
        Ok(requested) => requested,
        Err(_) => {
            warn!(
                "Ignoring invalid max clients value {:?}, using {}",
                value, DEFAULT_MAX_CLIENTS
            );
            return Ok(DEFAULT_MAX_CLIENTS);
        }
    };

    usize::try_from(requested)
        .ok()
        .filter(|max_clients| *max_clients >= MIN_CLIENTS)
        .ok_or(RelayError::InvalidCapacity {
            requested,
            minimum: MIN_CLIENTS,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.bind_address.port(), 5000);
        assert!(config.bind_address.ip().is_unspecified());
    }

    #[test]
    fn test_resolve_max_clients() {
        assert_eq!(resolve_max_clients(None).unwrap(), 3);
        assert_eq!(resolve_max_clients(Some("8")).unwrap(), 8);
        assert_eq!(resolve_max_clients(Some(" 4 ")).unwrap(), 4);
        assert_eq!(resolve_max_clients(Some("2")).unwrap(), 2);
        assert_eq!(resolve_max_clients(Some("many")).unwrap(), 3);
        assert_eq!(resolve_max_clients(Some("2.5")).unwrap(), 3);
    }

    #[test]
    fn test_small_or_negative_max_clients_is_fatal() {
        for (raw, expected) in [("1", 1), ("0", 0), ("-1", -1), ("-40", -40)] {
            match resolve_max_clients(Some(raw)) {
                Err(RelayError::InvalidCapacity { requested, minimum }) => {
                    assert_eq!(requested, expected);
                    assert_eq!(minimum, 2);
                }
                other => panic!("{:?} should be rejected, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_config_rejects_small_capacity() {
        let addr = ServerConfig::default().bind_address;
        assert!(ServerConfig::new(addr, 1).is_err());
        assert!(ServerConfig::new(addr, 0).is_err());
        assert_eq!(ServerConfig::new(addr, 2).unwrap().max_clients, 2);
    }
}
