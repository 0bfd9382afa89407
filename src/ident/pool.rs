//! Lock-free allocator of [`StreamId`]s.
//!
//! The pool is a fixed array of 256 in-use flags. Claiming a slot is a single
//! `compare_exchange`, so no allocator can observe a half-claimed slot, and
//! releasing is a single swap. Each server builds its own pool and shares it
//! through an `Arc`.

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::{EXHAUSTED_SENTINEL, FIRST_STREAM_ID, LAST_STREAM_ID, StreamId};

const SLOTS: usize = u8::MAX as usize + 1;

/// Returned by [`IdentifierPool::allocate`] when every identifier is in use.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("identifier pool exhausted ({in_use} streams active)")]
pub struct PoolExhausted {
    /// Number of identifiers in use when allocation failed.
    pub in_use: usize,
}

impl PoolExhausted {
    /// Raw sentinel the pool reports in place of an identifier.
    #[must_use]
    pub const fn sentinel(self) -> u8 { EXHAUSTED_SENTINEL }
}

/// Fixed-size pool of connection identifiers.
#[derive(Debug)]
pub struct IdentifierPool {
    slots: [AtomicBool; SLOTS],
    last: u8,
}

impl Default for IdentifierPool {
    fn default() -> Self { Self::new() }
}

impl IdentifierPool {
    /// Create a pool exposing every identifier in `[1, 254]`.
    #[must_use]
    pub fn new() -> Self { Self::with_capacity(usize::from(LAST_STREAM_ID)) }

    /// Create a pool that hands out at most `capacity` identifiers.
    ///
    /// `capacity` is clamped to `1..=254`; the pool then allocates from
    /// `[1, capacity]`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let last = u8::try_from(capacity.clamp(1, usize::from(LAST_STREAM_ID)))
            .unwrap_or(LAST_STREAM_ID);
        Self {
            slots: std::array::from_fn(|_| AtomicBool::new(false)),
            last,
        }
    }

    /// Maximum number of identifiers this pool may have in use at once.
    #[must_use]
    pub fn capacity(&self) -> usize { usize::from(self.last - FIRST_STREAM_ID + 1) }

    /// Claim the lowest free identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PoolExhausted`] when every identifier is in use.
    pub fn allocate(&self) -> Result<StreamId, PoolExhausted> {
        for raw in FIRST_STREAM_ID..=self.last {
            let slot = &self.slots[usize::from(raw)];
            if slot
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
                && let Some(id) = StreamId::new(raw)
            {
                return Ok(id);
            }
        }
        Err(PoolExhausted {
            in_use: self.in_use(),
        })
    }

    /// Return `id` to the pool.
    ///
    /// Releasing a free identifier is a no-op. Returns whether the identifier
    /// was in use beforehand.
    pub fn release(&self, id: StreamId) -> bool {
        self.slots[id.slot()].swap(false, Ordering::AcqRel)
    }

    /// Report whether `id` is currently allocated.
    #[must_use]
    pub fn is_allocated(&self, id: StreamId) -> bool {
        self.slots[id.slot()].load(Ordering::Acquire)
    }

    /// Count identifiers currently in use.
    #[must_use]
    pub fn in_use(&self) -> usize {
        (FIRST_STREAM_ID..=self.last)
            .filter(|raw| self.slots[usize::from(*raw)].load(Ordering::Acquire))
            .count()
    }
}
