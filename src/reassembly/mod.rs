//! Frame reassembly.
//!
//! This module turns per-stream fragment sequences back into [`Frame`]s. The
//! state for each stream lives in a [`StreamTable`] owned by a single
//! [`Reassembler`], which delivers finished frames to a [`FrameSink`].

pub mod engine;
pub mod frame;
pub mod sink;
pub mod state;
pub mod table;

pub use engine::{DropReason, IngestOutcome, Reassembler};
pub use frame::Frame;
pub use sink::FrameSink;
pub use state::{Absorb, Placement, ReassemblyLimits, StreamState};
pub use table::StreamTable;
