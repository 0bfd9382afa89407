//! Map from stream identifier to reassembly state.

use std::collections::{HashMap, hash_map::Entry};

use super::StreamState;
use crate::ident::StreamId;

/// Reassembly states keyed by [`StreamId`].
///
/// Each dispatch worker owns its own table and only ever sees the streams
/// routed to it, so the table carries no lock.
#[derive(Debug, Default)]
pub struct StreamTable {
    streams: HashMap<StreamId, StreamState>,
}

impl StreamTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Borrow the state for `id`, creating an empty one on first use.
    pub fn get_or_create(&mut self, id: StreamId) -> &mut StreamState {
        match self.streams.entry(id) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                tracing::trace!(stream = %id, "creating reassembly state");
                vacant.insert(StreamState::default())
            }
        }
    }

    /// Borrow the state for `id` if one exists.
    #[must_use]
    pub fn get(&self, id: StreamId) -> Option<&StreamState> { self.streams.get(&id) }

    /// Destroy the state for `id`.
    pub fn remove(&mut self, id: StreamId) -> Option<StreamState> { self.streams.remove(&id) }

    /// Number of streams with state.
    #[must_use]
    pub fn len(&self) -> usize { self.streams.len() }

    /// Report whether the table holds no state.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.streams.is_empty() }
}
