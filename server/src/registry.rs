//! Rank registry: admission, removal and promotion of ranked clients
//!
//! The registry maps each rank to the client holding it. Ranks double as a
//! privilege level and as a slot index, so the mapping must stay dense: at
//! every point where the lock is released the live ranks are exactly
//! `0..len()`. Admission appends at the end, and removal closes the gap by
//! shifting every more junior client up by one in a single pass.
//!
//! The registry itself is not synchronised. The server keeps it behind one
//! `RwLock`, taking the write side for admit/remove and the read side for
//! broadcast and relay fan-out.

use crate::connection::{ClientHandle, ConnectionId};
use crate::error::RelayError;
use log::{debug, info};
use shared::{Rank, ServerNotice, MIN_CLIENTS};
use std::collections::BTreeMap;

/// A registered connection paired with its current rank
#[derive(Debug, Clone)]
pub struct RankedClient {
    pub handle: ClientHandle,
    pub rank: Rank,
}

impl RankedClient {
    /// Sends text to this client, swallowing delivery failures.
    ///
    /// A failed send means the peer is gone; its own receive loop will notice
    /// and remove it, so nothing is done here beyond logging.
    fn deliver(&self, text: &str) {
        if let Err(e) = self.handle.send(text) {
            debug!("Dropped message for rank {}: {}", self.rank, e);
        }
    }
}

pub struct RankRegistry {
    /// Registered clients keyed by rank
    entries: BTreeMap<Rank, RankedClient>,
    /// Maximum number of concurrent clients
    capacity: usize,
}

impl RankRegistry {
    /// Creates an empty registry. Fails if `capacity` is below two.
    pub fn new(capacity: usize) -> Result<Self, RelayError> {
        if capacity < MIN_CLIENTS {
            return Err(RelayError::InvalidCapacity {
                requested: capacity as i64,
                minimum: MIN_CLIENTS,
            });
        }

        Ok(Self {
            entries: BTreeMap::new(),
            capacity,
        })
    }

    /// Registers `handle` at the next free rank.
    ///
    /// At capacity the registry is left untouched and `CapacityExceeded` is
    /// returned; telling the peer and closing it is up to the caller.
    pub fn admit(&mut self, handle: ClientHandle) -> Result<Rank, RelayError> {
        if self.entries.len() >= self.capacity {
            return Err(RelayError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let rank = self.next_rank();
        self.entries.insert(rank, RankedClient { handle, rank });
        Ok(rank)
    }

    /// Removes the client at `rank`, closes its connection, tells everyone
    /// else it left and promotes the clients below it.
    ///
    /// Returns `None` without touching anything when the rank is vacant.
    pub fn remove(&mut self, rank: Rank) -> Option<RankedClient> {
        let Some(removed) = self.entries.remove(&rank) else {
            debug!("No client at rank {}, nothing to remove", rank);
            return None;
        };

        removed.handle.close();
        info!("Client with rank {} has disconnected", rank);

        self.broadcast(&ServerNotice::Departed { rank }.to_string(), None);
        self.promote(rank);

        Some(removed)
    }

    /// Removes whichever rank `id` currently holds.
    ///
    /// A connection's rank changes under promotion, so the close path looks it
    /// up here under the same lock rather than trusting a cached value. Calling
    /// this twice for one connection is a no-op the second time.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Rank> {
        let rank = self.rank_of(id)?;
        self.remove(rank).map(|client| client.rank)
    }

    /// Shifts every client ranked below the vacant `rank` up by one and tells
    /// each of them its new rank.
    ///
    /// Works from a snapshot of the affected ranks taken before any entry
    /// moves. Ascending order guarantees the target slot is always free.
    pub fn promote(&mut self, rank: Rank) {
        if self.entries.contains_key(&rank) {
            debug!("Rank {} is occupied, skipping promotion", rank);
            return;
        }

        let to_shift: Vec<Rank> = self
            .entries
            .range(rank + 1..)
            .map(|(key, _)| *key)
            .collect();

        if to_shift.is_empty() {
            return;
        }

        info!("Promoting clients below rank {}", rank);

        for key in to_shift {
            if let Some(mut client) = self.entries.remove(&key) {
                client.rank = key - 1;
                client.deliver(&ServerNotice::Promoted { rank: client.rank }.to_string());
                self.entries.insert(client.rank, client);
            }
        }
    }

    /// Sends `message` to every client except the `exclude` connection.
    pub fn broadcast(&self, message: &str, exclude: Option<ConnectionId>) {
        for client in self.entries.values() {
            if Some(client.handle.id) == exclude {
                continue;
            }
            client.deliver(message);
        }
    }

    /// Clients with a rank strictly greater than `rank`, most senior first.
    pub fn recipients_after(&self, rank: Rank) -> impl Iterator<Item = &RankedClient> {
        self.entries.range(rank + 1..).map(|(_, c)| c)
    }

    pub fn rank_of(&self, id: ConnectionId) -> Option<Rank> {
        self.entries
            .values()
            .find(|client| client.handle.id == id)
            .map(|client| client.rank)
    }

    pub fn get(&self, rank: Rank) -> Option<&RankedClient> {
        self.entries.get(&rank)
    }

    /// Rank the next admitted client will receive.
    pub fn next_rank(&self) -> Rank {
        self.entries.len()
    }

    /// Live ranks in ascending order.
    pub fn ranks(&self) -> Vec<Rank> {
        self.entries.keys().copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
