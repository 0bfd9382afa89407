#![doc(html_root_url = "https://docs.rs/fragmux/latest")]
//! Public API for the `fragmux` library.
//!
//! This crate reassembles media frames from fragments arriving over many
//! concurrent connections. Each connection borrows an 8-bit stream
//! identifier from an [`IdentifierPool`]; fragments are routed by that
//! identifier to a fixed set of reassembly workers, and completed (or
//! flagged broken) frames are handed to a [`FrameSink`].

pub mod config;
pub mod dispatch;
pub mod fragment;
pub mod ident;
pub mod lifecycle;
pub mod metrics;
pub mod panic;
pub mod reassembly;
#[cfg(not(loom))]
pub mod server;

pub use config::{ConfigError, EngineConfig};
pub use dispatch::{DispatchError, Dispatcher};
pub use fragment::{
    ContentType,
    FRAGMENT_MAGIC,
    Fragment,
    FragmentCodecError,
    FragmentHeader,
    FragmentIndex,
    decode_fragment,
    encode_fragment,
    fragment_overhead,
};
pub use ident::{IdentifierPool, PoolExhausted, StreamId};
pub use lifecycle::{ConnectionHandle, LifecycleAdapter, Rejection};
pub use metrics::{
    CONNECTIONS_ACTIVE,
    CONNECTIONS_REJECTED,
    FRAGMENTS_DROPPED,
    FRAMES_DELIVERED,
    SINK_PANICS,
};
pub use reassembly::{DropReason, Frame, FrameSink, IngestOutcome, Reassembler};
#[cfg(not(loom))]
pub use server::{BackoffConfig, FrameServer, ServerError};
