//! Tokio-based TCP transport feeding the reassembly engine.
//!
//! `FrameServer` accepts TCP connections, validates each one through a
//! [`LifecycleAdapter`] and reads length-delimited fragment records from it
//! until the peer disconnects or the server shuts down.

use std::sync::Arc;

use tokio::{net::TcpListener, sync::oneshot};

use crate::lifecycle::LifecycleAdapter;

/// TCP server driving a [`LifecycleAdapter`].
///
/// The server carries a typestate `S` indicating whether it is [`Unbound`]
/// (not yet bound to a TCP listener) or [`Bound`]. New servers start
/// `Unbound` and must call [`bind`](FrameServer::bind) or
/// [`bind_listener`](FrameServer::bind_listener) before running. Each accept
/// task shares the same listener; every accepted connection gets its own
/// task.
pub struct FrameServer<S = Unbound>
where
    S: ServerState,
{
    pub(crate) adapter: LifecycleAdapter,
    pub(crate) accept_workers: usize,
    pub(crate) max_record_len: usize,
    /// Channel used to notify when the server is ready.
    ///
    /// A `oneshot::Sender` can transmit only one readiness notification, so a
    /// new sender must be provided each time the server is started.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) backoff_config: BackoffConfig,
    /// Typestate tracking whether the server has been bound to a listener.
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod config;
mod connection;
pub mod error;
mod runtime;

pub use error::ServerError;
/// Re-exported configuration types for server backoff behaviour.
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
