//! Worker task driving one reassembly shard.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::Job;
use crate::{panic::format_panic, reassembly::Reassembler};

/// Run the worker until its queue closes or `shutdown` is cancelled.
///
/// A panic escaping the worker body is logged; the tracker still observes the
/// task as finished.
pub(super) async fn run_worker(
    index: usize,
    jobs: mpsc::Receiver<Job>,
    reassembler: Reassembler,
    shutdown: CancellationToken,
) {
    let fut = AssertUnwindSafe(worker_loop(index, jobs, reassembler, shutdown)).catch_unwind();
    if let Err(panic) = fut.await {
        let panic_msg = format_panic(panic);
        error!(panic = %panic_msg, worker = index, "dispatch worker panicked");
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn worker_loop(
    index: usize,
    mut jobs: mpsc::Receiver<Job>,
    mut reassembler: Reassembler,
    shutdown: CancellationToken,
) {
    debug!(worker = index, "dispatch worker started");
    loop {
        let job = select! {
            biased;

            () = shutdown.cancelled() => break,
            job = jobs.recv() => job,
        };
        match job {
            Some(Job::Fragment(fragment)) => {
                let outcome = reassembler.ingest(fragment);
                trace!(worker = index, ?outcome, "fragment processed");
            }
            Some(Job::Close { stream, ack }) => {
                let had_state = reassembler.remove(stream);
                if ack.send(had_state).is_err() {
                    debug!(worker = index, %stream, "close acknowledgement receiver dropped");
                }
            }
            None => break,
        }
    }
    debug!(
        worker = index,
        streams = reassembler.stream_count(),
        "dispatch worker stopped"
    );
}
