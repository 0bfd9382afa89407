//! Runtime control for [`FrameServer`].

mod accept;
mod backoff;

use std::sync::Arc;

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use log::warn;
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::info;

use super::{Bound, FrameServer, ServerError};

impl FrameServer<Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use fragmux::{config::EngineConfig, reassembly::Frame, server::FrameServer};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), fragmux::server::ServerError> {
    /// let sink = Arc::new(|frame: Frame| println!("{} bytes", frame.size()));
    /// let server =
    ///     FrameServer::from_config(&EngineConfig::default(), sink)?.bind(([127, 0, 0, 1], 8000).into())?;
    /// server.run().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    ///
    /// use fragmux::{config::EngineConfig, reassembly::Frame, server::FrameServer};
    ///
    /// async fn try_run() {
    ///     FrameServer::from_config(&EngineConfig::default(), Arc::new(|_: Frame| {}))
    ///         .expect("valid config")
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors; the `Result` is kept for future fatal conditions.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown the accept tasks stop, every open connection is torn down
    /// through [`LifecycleAdapter::on_disconnect`](crate::lifecycle::LifecycleAdapter::on_disconnect)
    /// and finally the dispatcher workers are stopped.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let FrameServer {
            adapter,
            accept_workers,
            max_record_len,
            ready_tx,
            backoff_config,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        for _ in 0..accept_workers {
            tracker.spawn(accept_loop(
                Arc::clone(&listener),
                AcceptLoopOptions {
                    adapter: adapter.clone(),
                    max_record_len,
                    shutdown: shutdown_token.clone(),
                    tracker: tracker.clone(),
                    backoff: backoff_config,
                },
            ));
        }
        info!(
            addr = ?listener.local_addr().ok(),
            accept_workers,
            "server listening"
        );

        // Signal readiness after all accept tasks have been spawned.
        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        adapter.dispatcher().shutdown().await;
        info!("server stopped");
        Ok(())
    }
}
