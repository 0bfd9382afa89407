//! Helpers shared by the reassembly unit tests.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use crate::{
    fragment::{Fragment, FragmentHeader, FragmentIndex},
    ident::{IdentifierPool, StreamId},
    reassembly::{Frame, FrameSink, Reassembler, ReassemblyLimits},
};

/// Sink collecting every delivered frame.
#[derive(Clone, Default)]
pub(super) struct CollectingSink(Arc<Mutex<Vec<Frame>>>);

impl CollectingSink {
    pub(super) fn frames(&self) -> Vec<Frame> {
        self.0.lock().expect("sink mutex poisoned").clone()
    }
}

impl FrameSink for CollectingSink {
    fn deliver(&self, frame: Frame) { self.0.lock().expect("sink mutex poisoned").push(frame); }
}

pub(super) fn limits(max_frame_size: usize, max_fragment_payload: usize) -> ReassemblyLimits {
    ReassemblyLimits {
        max_frame_size: NonZeroUsize::new(max_frame_size).expect("non-zero"),
        max_fragment_payload: NonZeroUsize::new(max_fragment_payload).expect("non-zero"),
    }
}

/// Build a reassembler with one allocated stream.
pub(super) fn setup(limits: ReassemblyLimits) -> (Reassembler, CollectingSink, StreamId) {
    let pool = Arc::new(IdentifierPool::new());
    let stream = pool.allocate().expect("allocate stream");
    let sink = CollectingSink::default();
    let reassembler = Reassembler::new(pool, limits, Arc::new(sink.clone()));
    (reassembler, sink, stream)
}

/// Split `payload` into in-order fragments of at most `chunk` bytes.
pub(super) fn split(
    stream: StreamId,
    frame_number: u16,
    payload: &[u8],
    chunk: usize,
    pts: u64,
) -> Vec<Fragment> {
    let count = payload.chunks(chunk).count();
    payload
        .chunks(chunk)
        .enumerate()
        .map(|(i, part)| {
            let index = u16::try_from(i).expect("fragment index fits u16");
            let offset = u32::try_from(i * chunk).expect("offset fits u32");
            let mut header = FragmentHeader::new(frame_number, FragmentIndex::new(index), offset)
                .with_pts(pts);
            if i + 1 == count {
                header = header.last();
            }
            Fragment::new(stream, header, part.to_vec())
        })
        .collect()
}
