//! Per-connection handle held by the transport.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::warn;

use crate::ident::StreamId;

/// State shared by every clone of a [`ConnectionHandle`].
#[derive(Debug)]
struct ConnectionContext {
    stream: StreamId,
    peer: SocketAddr,
    released: AtomicBool,
}

impl Drop for ConnectionContext {
    fn drop(&mut self) {
        if !self.released.load(Ordering::Acquire) {
            warn!(
                stream = %self.stream,
                peer = %self.peer,
                "connection handle dropped without disconnect; identifier stays allocated"
            );
        }
    }
}

/// Handle identifying one accepted connection.
///
/// Returned by
/// [`LifecycleAdapter::on_connect_validate`](super::LifecycleAdapter::on_connect_validate)
/// and passed back on every data and disconnect event.
#[derive(Clone, Debug)]
pub struct ConnectionHandle(Arc<ConnectionContext>);

impl ConnectionHandle {
    pub(super) fn new(stream: StreamId, peer: SocketAddr) -> Self {
        Self(Arc::new(ConnectionContext {
            stream,
            peer,
            released: AtomicBool::new(false),
        }))
    }

    /// Identifier borrowed by the connection.
    #[must_use]
    pub fn stream(&self) -> StreamId { self.0.stream }

    /// Remote address of the connection.
    #[must_use]
    pub fn peer(&self) -> SocketAddr { self.0.peer }

    /// Whether the connection's identifier has been returned to the pool.
    #[must_use]
    pub fn is_released(&self) -> bool { self.0.released.load(Ordering::Acquire) }

    /// Mark the handle released, returning `true` for the first caller only.
    pub(super) fn begin_release(&self) -> bool { !self.0.released.swap(true, Ordering::AcqRel) }
}
