//! Dispatch layer routing fragments to reassembly workers.
//!
//! The [`Dispatcher`] owns a fixed set of worker tasks. Each worker holds its
//! own [`Reassembler`] shard and a bounded queue. Fragments are routed by
//! stream identifier, so every fragment of a stream is processed by the same
//! worker in arrival order and no shard is ever shared.

mod error;
mod worker;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info};

pub use self::error::DispatchError;
use crate::{
    config::{ConfigError, EngineConfig},
    fragment::Fragment,
    ident::{IdentifierPool, StreamId},
    reassembly::{FrameSink, Reassembler},
};

/// Work item queued for a worker.
#[derive(Debug)]
enum Job {
    Fragment(Fragment),
    /// Remove the stream's state and acknowledge once done.
    Close {
        stream: StreamId,
        ack: oneshot::Sender<bool>,
    },
}

/// Handle to the reassembly workers.
///
/// Cloning is cheap; all clones feed the same workers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fragmux::{
///     config::EngineConfig,
///     dispatch::Dispatcher,
///     ident::IdentifierPool,
///     reassembly::Frame,
/// };
///
/// # #[tokio::main]
/// # async fn main() {
/// let pool = Arc::new(IdentifierPool::new());
/// let dispatcher = Dispatcher::spawn(
///     &EngineConfig::default(),
///     pool,
///     Arc::new(|frame: Frame| println!("{} bytes", frame.size())),
/// )
/// .expect("valid config");
/// dispatcher.shutdown().await;
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Dispatcher {
    queues: Arc<[mpsc::Sender<Job>]>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Validate `config` and spawn its workers on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(
        config: &EngineConfig,
        pool: Arc<IdentifierPool>,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let limits = config.limits()?;
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let queues: Vec<_> = (0..config.workers)
            .map(|index| {
                let (tx, rx) = mpsc::channel(config.queue_capacity);
                let reassembler = Reassembler::new(Arc::clone(&pool), limits, Arc::clone(&sink));
                tracker.spawn(worker::run_worker(index, rx, reassembler, shutdown.clone()));
                tx
            })
            .collect();
        tracker.close();
        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            max_frame_size = config.max_frame_size,
            "dispatcher started"
        );
        Ok(Self {
            queues: queues.into(),
            shutdown,
            tracker,
        })
    }

    /// Number of worker tasks.
    #[must_use]
    pub fn workers(&self) -> usize { self.queues.len() }

    /// Index of the worker responsible for `stream`.
    #[must_use]
    pub fn worker_for(&self, stream: StreamId) -> usize {
        usize::from(stream.get()) % self.queues.len()
    }

    /// Report whether [`shutdown`](Self::shutdown) has been requested.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }

    /// Queue a fragment for its stream's worker.
    ///
    /// Waits while the worker's queue is full; fragments are never dropped
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] after shutdown.
    pub async fn submit(&self, fragment: Fragment) -> Result<(), DispatchError> {
        let queue = self.queue_for(fragment.stream())?;
        queue
            .send(Job::Fragment(fragment))
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Remove `stream`'s reassembly state once every fragment already queued
    /// for it has been processed.
    ///
    /// Returns `true` if the worker held state for the stream. Returns
    /// `false` when the worker is gone, in which case nothing can still
    /// reference the stream.
    pub async fn close_stream(&self, stream: StreamId) -> bool {
        let Ok(queue) = self.queue_for(stream) else {
            return false;
        };
        let (ack, done) = oneshot::channel();
        if queue.send(Job::Close { stream, ack }).await.is_err() {
            debug!(%stream, "worker gone before stream close");
            return false;
        }
        done.await.unwrap_or_else(|_| {
            debug!(%stream, "worker stopped before acknowledging stream close");
            false
        })
    }

    /// Stop every worker and wait for them to finish.
    ///
    /// Jobs still queued at this point are discarded.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.wait().await;
        info!("dispatcher stopped");
    }

    fn queue_for(&self, stream: StreamId) -> Result<&mpsc::Sender<Job>, DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::Closed);
        }
        self.queues
            .get(self.worker_for(stream))
            .ok_or(DispatchError::Closed)
    }
}
