//! Connection handling for [`FrameServer`](super::FrameServer).
//!
//! Each connection carries length-delimited records (`u32` big-endian
//! length prefix), one encoded fragment per record.

use std::{net::SocketAddr, panic::AssertUnwindSafe};

use futures::{FutureExt, StreamExt};
use tokio::{net::TcpStream, select};
use tokio_util::{
    codec::{FramedRead, LengthDelimitedCodec},
    sync::CancellationToken,
    task::TaskTracker,
};
use tracing::{debug, error, warn};

use crate::{
    fragment::decode_fragment,
    lifecycle::{ConnectionHandle, LifecycleAdapter},
    panic::format_panic,
};

/// Why a connection's read loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Closed {
    Eof,
    ReadError,
    DecodeError,
    DispatcherGone,
    Shutdown,
}

/// Spawn a task serving one accepted TCP connection.
///
/// The connection is validated before any byte is read; rejected
/// connections are closed immediately. Panics in the read loop are logged
/// and the connection is still torn down.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    peer: SocketAddr,
    adapter: LifecycleAdapter,
    max_record_len: usize,
    shutdown: CancellationToken,
    tracker: &TaskTracker,
) {
    let Ok(handle) = adapter.on_connect_validate(peer) else {
        return;
    };
    tracker.spawn(async move {
        let fut = AssertUnwindSafe(read_fragments(
            stream,
            &adapter,
            &handle,
            max_record_len,
            &shutdown,
        ))
        .catch_unwind();

        match fut.await {
            Ok(reason) => debug!(stream = %handle.stream(), %peer, ?reason, "connection ended"),
            Err(panic) => {
                let panic_msg = format_panic(panic);
                error!(panic = %panic_msg, stream = %handle.stream(), %peer, "connection task panicked");
            }
        }
        adapter.on_disconnect(&handle).await;
    });
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn read_fragments(
    stream: TcpStream,
    adapter: &LifecycleAdapter,
    handle: &ConnectionHandle,
    max_record_len: usize,
    shutdown: &CancellationToken,
) -> Closed {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_record_len)
        .new_codec();
    let mut records = FramedRead::new(stream, codec);
    loop {
        let next = select! {
            biased;

            () = shutdown.cancelled() => return Closed::Shutdown,
            next = records.next() => next,
        };
        let record = match next {
            None => return Closed::Eof,
            Some(Ok(record)) => record.freeze(),
            Some(Err(e)) => {
                warn!(stream = %handle.stream(), error = %e, "failed to read fragment record");
                return Closed::ReadError;
            }
        };
        let (header, payload) = match decode_fragment(&record) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(stream = %handle.stream(), error = %e, "failed to decode fragment record");
                return Closed::DecodeError;
            }
        };
        let payload = record.slice_ref(payload);
        if adapter.on_data(handle, header, payload).await.is_err() {
            return Closed::DispatcherGone;
        }
    }
}
