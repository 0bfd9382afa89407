//! Configuration utilities for [`FrameServer`].

use std::{num::NonZeroUsize, sync::Arc};

use tokio::sync::oneshot;

use super::{BackoffConfig, FrameServer, ServerError, ServerState, Unbound};
use crate::{
    config::{DEFAULT_MAX_FRAGMENT_PAYLOAD, EngineConfig},
    dispatch::Dispatcher,
    fragment::fragment_overhead,
    ident::IdentifierPool,
    lifecycle::LifecycleAdapter,
    reassembly::FrameSink,
};

pub mod binding;


/// Longest record accepted for fragments carrying at most `max_payload` bytes.
fn record_limit(max_payload: usize) -> usize {
    fragment_overhead().get().saturating_add(max_payload)
}

impl FrameServer<Unbound> {
    /// Create a server feeding `adapter`.
    ///
    /// The accept task count defaults to the number of available CPU cores
    /// (or 1 if this cannot be determined). Records are limited to the
    /// default fragment payload plus the fixed fragment overhead.
    #[must_use]
    pub fn new(adapter: LifecycleAdapter) -> Self {
        let accept_workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            adapter,
            accept_workers,
            max_record_len: record_limit(DEFAULT_MAX_FRAGMENT_PAYLOAD),
            ready_tx: None,
            backoff_config: BackoffConfig::default(),
            state: Unbound,
        }
    }

    /// Build the identifier pool, dispatcher and adapter described by
    /// `config` and wrap them in a server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config` is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn from_config(config: &EngineConfig, sink: Arc<dyn FrameSink>) -> Result<Self, ServerError> {
        let pool = Arc::new(IdentifierPool::with_capacity(config.max_connections));
        let dispatcher = Dispatcher::spawn(config, Arc::clone(&pool), sink)?;
        let server = Self::new(LifecycleAdapter::new(pool, dispatcher))
            .max_record_len(record_limit(config.max_fragment_payload));
        Ok(server)
    }
}

impl<S> FrameServer<S>
where
    S: ServerState,
{
    /// Set the number of accept tasks sharing the listener.
    #[must_use]
    pub fn accept_workers(mut self, count: usize) -> Self {
        self.accept_workers = count.max(1);
        self
    }

    /// Set the largest length-delimited record a connection may send.
    #[must_use]
    pub fn max_record_len(mut self, len: usize) -> Self {
        self.max_record_len = len.max(1);
        self
    }

    /// Configure a channel used to signal when the server is ready to accept connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Configure the exponential back-off applied when `accept()` fails.
    #[must_use]
    pub fn accept_backoff(mut self, cfg: BackoffConfig) -> Self {
        self.backoff_config = cfg.normalized();
        self
    }

    /// Returns the configured number of accept tasks.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.accept_workers }

    /// Returns the configured record length limit.
    #[inline]
    #[must_use]
    pub const fn record_len_limit(&self) -> usize { self.max_record_len }

    /// Returns the configured accept back-off.
    #[inline]
    #[must_use]
    pub const fn backoff(&self) -> BackoffConfig { self.backoff_config }

    /// Adapter receiving this server's connection events.
    #[must_use]
    pub fn adapter(&self) -> &LifecycleAdapter { &self.adapter }
}
