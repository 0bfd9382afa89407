//! Connection identifiers and the lock-free pool that hands them out.
//!
//! Every accepted connection borrows one 8-bit [`StreamId`] from an
//! [`IdentifierPool`] for its whole lifetime. The identifier keys the
//! connection's reassembly state and is stamped on every frame emitted for
//! it, so it must never be handed to a second connection while the first
//! still has fragments in flight.

use static_assertions::const_assert;

mod id;
mod pool;

pub use id::StreamId;
pub use pool::{IdentifierPool, PoolExhausted};

/// Lowest identifier the pool will allocate.
pub const FIRST_STREAM_ID: u8 = 1;
/// Highest identifier the pool will allocate.
pub const LAST_STREAM_ID: u8 = u8::MAX - 1;
/// Raw value reported when the pool has no free identifier left.
pub const EXHAUSTED_SENTINEL: u8 = u8::MAX;
/// Number of identifiers that may be active simultaneously.
pub const MAX_STREAMS: usize = (LAST_STREAM_ID - FIRST_STREAM_ID + 1) as usize;

const_assert!(FIRST_STREAM_ID > 0);
const_assert!(LAST_STREAM_ID < EXHAUSTED_SENTINEL);
const_assert!(MAX_STREAMS == 254);
