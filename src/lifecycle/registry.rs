//! Registry of connected peers.
//!
//! `ConnectionRegistry` records which peer currently owns each allocated
//! stream identifier. Entries are inserted when a connection is validated and
//! removed when its identifier is released.

use std::net::SocketAddr;

use dashmap::DashMap;

use crate::ident::StreamId;

/// Concurrent map of active stream identifiers to peer addresses.
#[derive(Debug, Default)]
pub struct ConnectionRegistry(DashMap<StreamId, SocketAddr>);

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record `peer` as the owner of `stream`.
    pub fn insert(&self, stream: StreamId, peer: SocketAddr) { self.0.insert(stream, peer); }

    /// Forget `stream`, returning the peer that owned it.
    pub fn remove(&self, stream: StreamId) -> Option<SocketAddr> {
        self.0.remove(&stream).map(|(_, peer)| peer)
    }

    /// Snapshot of every registered connection, ordered by identifier.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(StreamId, SocketAddr)> {
        let mut entries: Vec<_> = self.0.iter().map(|e| (*e.key(), *e.value())).collect();
        entries.sort_unstable_by_key(|(stream, _)| *stream);
        entries
    }
}
