//! Accept-loop utilities for server runtime.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::sleep,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::backoff::{AcceptBackoff, BackoffConfig};
use crate::{lifecycle::LifecycleAdapter, server::connection::spawn_connection_task};

/// Source of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

#[derive(Debug)]
pub(in crate::server) struct AcceptLoopOptions {
    pub adapter: LifecycleAdapter,
    pub max_record_len: usize,
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
    pub backoff: BackoffConfig,
}

/// Accept connections from `listener` until `options.shutdown` is cancelled.
///
/// Every accepted connection is handed to its own task, tracked by
/// `options.tracker`. Accept failures are logged and retried after an
/// exponentially growing delay.
pub(in crate::server) async fn accept_loop<L>(listener: Arc<L>, options: AcceptLoopOptions)
where
    L: AcceptListener + 'static,
{
    let mut backoff = AcceptBackoff::new(options.backoff);
    while accept_iteration(&listener, &options, &mut backoff).await {}
}

/// Accept one connection, or wait out the retry delay after a failure.
///
/// Returns `false` once shutdown is requested.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn accept_iteration<L>(
    listener: &Arc<L>,
    options: &AcceptLoopOptions,
    backoff: &mut AcceptBackoff,
) -> bool
where
    L: AcceptListener + 'static,
{
    select! {
        biased;

        () = options.shutdown.cancelled() => false,
        res = listener.accept() => match res {
            Ok((stream, peer)) => {
                spawn_connection_task(
                    stream,
                    peer,
                    options.adapter.clone(),
                    options.max_record_len,
                    options.shutdown.clone(),
                    &options.tracker,
                );
                backoff.reset();
                true
            }
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                let delay = backoff.after_failure();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}, retry_in={delay:?}");
                select! {
                    biased;

                    () = options.shutdown.cancelled() => false,
                    () = sleep(delay) => true,
                }
            }
        },
    }
}
