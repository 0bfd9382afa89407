//! Connection lifecycle adapter.
//!
//! [`LifecycleAdapter`] translates transport events (connect, data,
//! disconnect) into identifier allocation, fragment submission and stream
//! teardown. An identifier is only returned to the pool after the
//! dispatcher confirms that every fragment queued for it has been processed,
//! so a reused identifier never inherits stale fragments.

mod handle;
mod registry;

use std::{fmt, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use self::{handle::ConnectionHandle, registry::ConnectionRegistry};
use crate::{
    dispatch::{DispatchError, Dispatcher},
    fragment::{Fragment, FragmentHeader},
    ident::{IdentifierPool, PoolExhausted, StreamId},
    metrics,
    reassembly::DropReason,
};

/// Predicate deciding whether a peer may connect.
pub type PeerFilter = Arc<dyn Fn(SocketAddr) -> bool + Send + Sync + 'static>;

/// Reasons a connection attempt is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// The peer filter declined the remote address.
    #[error("peer {peer} refused by filter")]
    PeerRefused {
        /// Address of the refused peer.
        peer: SocketAddr,
    },
    /// Every identifier is in use.
    #[error(transparent)]
    Exhausted(#[from] PoolExhausted),
}

impl Rejection {
    /// Label used for logging and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PeerRefused { .. } => "peer_refused",
            Self::Exhausted(_) => "exhausted",
        }
    }
}

/// Bridges transport callbacks to the pool and the dispatcher.
#[derive(Clone)]
pub struct LifecycleAdapter {
    pool: Arc<IdentifierPool>,
    dispatcher: Dispatcher,
    filter: Option<PeerFilter>,
    registry: Arc<ConnectionRegistry>,
}

impl fmt::Debug for LifecycleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleAdapter")
            .field("in_use", &self.pool.in_use())
            .field("dispatcher", &self.dispatcher)
            .field("filter", &self.filter.as_ref().map(|_| "Some(<filter>)"))
            .field("registry", &self.registry)
            .finish()
    }
}

impl LifecycleAdapter {
    /// Create an adapter accepting every peer.
    #[must_use]
    pub fn new(pool: Arc<IdentifierPool>, dispatcher: Dispatcher) -> Self {
        Self {
            pool,
            dispatcher,
            filter: None,
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Only accept peers for which `filter` returns `true`.
    #[must_use]
    pub fn with_peer_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(SocketAddr) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Identifier pool shared with the reassemblers.
    #[must_use]
    pub fn pool(&self) -> &Arc<IdentifierPool> { &self.pool }

    /// Dispatcher receiving this adapter's fragments.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }

    /// Decide whether `peer` may connect and, if so, allocate its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::PeerRefused`] if the peer filter declines and
    /// [`Rejection::Exhausted`] if no identifier is free.
    pub fn on_connect_validate(&self, peer: SocketAddr) -> Result<ConnectionHandle, Rejection> {
        self.validate(peer).inspect_err(|rejection| {
            metrics::inc_rejections(rejection.as_str());
            warn!(%peer, reason = rejection.as_str(), error = %rejection, "connection rejected");
        })
    }

    fn validate(&self, peer: SocketAddr) -> Result<ConnectionHandle, Rejection> {
        if let Some(filter) = &self.filter
            && !filter(peer)
        {
            return Err(Rejection::PeerRefused { peer });
        }
        let stream = self.pool.allocate()?;
        self.registry.insert(stream, peer);
        metrics::inc_connections();
        info!(%stream, %peer, "connection accepted");
        Ok(ConnectionHandle::new(stream, peer))
    }

    /// Hand one received fragment to the dispatcher.
    ///
    /// Fragments arriving on a handle that was already disconnected are
    /// discarded. Data and disconnect events for one handle must be issued
    /// sequentially, as a connection task does.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] if the dispatcher has shut down.
    pub async fn on_data(
        &self,
        handle: &ConnectionHandle,
        header: FragmentHeader,
        payload: impl Into<Bytes>,
    ) -> Result<(), DispatchError> {
        if handle.is_released() {
            let reason = DropReason::UnknownStream.as_str();
            debug!(stream = %handle.stream(), reason, "data after disconnect");
            metrics::inc_fragments_dropped(reason);
            return Ok(());
        }
        self.dispatcher
            .submit(Fragment::new(handle.stream(), header, payload))
            .await
    }

    /// Tear down a connection.
    ///
    /// The first call waits until the dispatcher has processed every fragment
    /// queued for the connection and discarded its incomplete frame, then
    /// returns the identifier to the pool. Later calls do nothing and return
    /// `false`.
    pub async fn on_disconnect(&self, handle: &ConnectionHandle) -> bool {
        if !handle.begin_release() {
            return false;
        }
        let stream = handle.stream();
        let had_state = self.dispatcher.close_stream(stream).await;
        self.registry.remove(stream);
        if !self.pool.release(stream) {
            warn!(%stream, "identifier was already free at disconnect");
        }
        metrics::dec_connections();
        info!(%stream, peer = %handle.peer(), had_state, "connection closed");
        true
    }

    /// Connections currently holding an identifier.
    #[must_use]
    pub fn active_connections(&self) -> Vec<(StreamId, SocketAddr)> { self.registry.snapshot() }
}
