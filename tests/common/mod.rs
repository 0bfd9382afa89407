//! Shared utilities for integration tests.
//!
//! Provides a frame-collecting sink, a small engine configuration and helpers
//! for building fragment sequences and wire records.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use fragmux::{
    config::EngineConfig,
    fragment::{FragmentHeader, FragmentIndex, encode_fragment},
    reassembly::{Frame, FrameSink},
};
use rstest::fixture;
use tokio::{sync::mpsc, time::timeout};

/// Create a TCP listener bound to a free local port.
#[expect(
    clippy::expect_used,
    reason = "binding to an ephemeral localhost port must abort the test immediately"
)]
pub fn unused_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("failed to bind port")
}

/// Engine configuration sized for tests.
#[fixture]
pub fn small_config() -> EngineConfig {
    EngineConfig {
        workers: 2,
        queue_capacity: 8,
        max_frame_size: 64 * 1024,
        max_fragment_payload: 1456,
        ..EngineConfig::default()
    }
}

/// Sink forwarding every frame into a channel.
pub struct ChannelSink(mpsc::UnboundedSender<Frame>);

impl FrameSink for ChannelSink {
    fn deliver(&self, frame: Frame) { let _ = self.0.send(frame); }
}

/// Build a sink and the receiver observing its frames.
pub fn channel_sink() -> (Arc<dyn FrameSink>, mpsc::UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelSink(tx)), rx)
}

/// Wait up to one second for the next frame.
pub async fn recv_frame(frames: &mut mpsc::UnboundedReceiver<Frame>) -> Frame {
    timeout(Duration::from_secs(1), frames.recv())
        .await
        .expect("frame delivered in time")
        .expect("sink channel open")
}

/// Split `payload` into in-order `(header, chunk)` pairs of at most `chunk` bytes.
pub fn fragments(frame_number: u16, payload: &[u8], chunk: usize, pts: u64) -> Vec<(FragmentHeader, Bytes)> {
    let count = payload.chunks(chunk).count();
    payload
        .chunks(chunk)
        .enumerate()
        .map(|(i, part)| {
            let index = u16::try_from(i).expect("index fits u16");
            let offset = u32::try_from(i * chunk).expect("offset fits u32");
            let mut header =
                FragmentHeader::new(frame_number, FragmentIndex::new(index), offset).with_pts(pts);
            if i + 1 == count {
                header = header.last();
            }
            (header, Bytes::copy_from_slice(part))
        })
        .collect()
}

/// Encode `(header, payload)` pairs as wire records.
pub fn records(parts: &[(FragmentHeader, Bytes)]) -> Vec<Bytes> {
    parts
        .iter()
        .map(|(header, payload)| {
            Bytes::from(encode_fragment(*header, payload).expect("encode fragment"))
        })
        .collect()
}
