//! Listener binding for [`FrameServer`].

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::TcpListener;

use crate::server::{Bound, FrameServer, ServerError, ServerState, Unbound};

impl<S> FrameServer<S>
where
    S: ServerState,
{
    fn bind_to_listener(self, std_listener: StdTcpListener) -> Result<FrameServer<Bound>, ServerError> {
        let FrameServer {
            adapter,
            accept_workers,
            max_record_len,
            ready_tx,
            backoff_config,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let tokio_listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

        Ok(FrameServer {
            adapter,
            accept_workers,
            max_record_len,
            ready_tx,
            backoff_config,
            state: Bound {
                listener: Arc::new(tokio_listener),
            },
        })
    }
}

impl FrameServer<Unbound> {
    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to a fresh address.
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if binding or configuring the listener fails.
    pub fn bind(self, addr: SocketAddr) -> Result<FrameServer<Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_to_listener(std_listener)
    }

    /// Bind to an existing `StdTcpListener`.
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if configuring the listener fails.
    pub fn bind_listener(self, std_listener: StdTcpListener) -> Result<FrameServer<Bound>, ServerError> {
        self.bind_to_listener(std_listener)
    }
}

impl FrameServer<Bound> {
    /// Returns the bound address, or `None` if retrieving it fails.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }

    /// Rebind to a fresh address.
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if binding or configuring the listener fails.
    pub fn bind(self, addr: SocketAddr) -> Result<Self, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_to_listener(std_listener)
    }

    /// Rebind using an existing `StdTcpListener`.
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if configuring the listener fails.
    pub fn bind_listener(self, std_listener: StdTcpListener) -> Result<Self, ServerError> {
        self.bind_to_listener(std_listener)
    }
}
