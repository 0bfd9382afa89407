//! Fragment-driven reassembly engine.
//!
//! [`Reassembler`] owns a [`StreamTable`] shard and drives one
//! [`StreamState`](super::StreamState) per stream. Every anomaly (loss,
//! reordering, oversized input, late or orphaned fragments) is absorbed
//! locally and surfaced either as the frame's broken flag or as an
//! [`IngestOutcome`]; nothing here returns an error that could disturb other
//! streams.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use tracing::{debug, error, warn};

use super::{Absorb, Frame, FrameSink, Placement, ReassemblyLimits, StreamTable};
use crate::{
    fragment::Fragment,
    ident::{IdentifierPool, StreamId},
    metrics,
    panic::format_panic,
};

/// Why a fragment was discarded without touching any frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The stream identifier is not allocated; its connection is gone.
    UnknownStream,
    /// The fragment belongs to a frame that was already emitted or
    /// superseded by a newer frame number.
    LateFragment,
}

impl DropReason {
    /// Label used for logging and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownStream => "unknown_stream",
            Self::LateFragment => "late_fragment",
        }
    }
}

/// What happened to a fragment handed to [`Reassembler::ingest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The fragment was buffered; its frame is still incomplete.
    Pending,
    /// The fragment finalized its frame, which was delivered to the sink.
    Emitted {
        /// Whether the delivered frame was flagged broken.
        broken: bool,
    },
    /// The fragment was discarded.
    Dropped(DropReason),
}

/// Reassembles fragments into frames and hands them to a [`FrameSink`].
pub struct Reassembler {
    table: StreamTable,
    pool: Arc<IdentifierPool>,
    limits: ReassemblyLimits,
    sink: Arc<dyn FrameSink>,
}

impl std::fmt::Debug for Reassembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reassembler")
            .field("table", &self.table)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Reassembler {
    /// Create a reassembler delivering to `sink`.
    ///
    /// Fragments are only accepted for identifiers currently allocated in
    /// `pool`.
    #[must_use]
    pub fn new(
        pool: Arc<IdentifierPool>,
        limits: ReassemblyLimits,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            table: StreamTable::new(),
            pool,
            limits,
            sink,
        }
    }

    /// Process one fragment.
    ///
    /// At most one frame completes per fragment, except when the fragment
    /// opens a newer frame number while an older frame is still incomplete:
    /// the older frame is then delivered first, flagged broken. Fragments of
    /// older frames are dropped without touching the frame in progress.
    pub fn ingest(&mut self, fragment: Fragment) -> IngestOutcome {
        let stream = fragment.stream();
        if !self.pool.is_allocated(stream) {
            return Self::dropped(stream, &fragment, DropReason::UnknownStream);
        }

        let frame_number = fragment.header().frame_number();
        let state = self.table.get_or_create(stream);
        let superseded = match state.place(fragment.header()) {
            Placement::Late => return Self::dropped(stream, &fragment, DropReason::LateFragment),
            Placement::Current => None,
            Placement::Newer => {
                debug!(
                    %stream,
                    superseded = ?state.in_progress(),
                    frame_number,
                    "new frame started before previous one completed"
                );
                state.finish(stream, true)
            }
        };

        let completed = match state.absorb(&fragment, self.limits) {
            Absorb::Pending => None,
            Absorb::Complete => state.finish(stream, false),
            Absorb::Oversized => {
                warn!(
                    %stream,
                    frame_number,
                    offset = fragment.header().offset(),
                    declared = ?fragment.header().total_size(),
                    len = fragment.len(),
                    limit = self.limits.max_frame_size.get(),
                    "frame exceeds size limit; emitting it broken"
                );
                state.finish(stream, true)
            }
        };

        if let Some(frame) = superseded {
            self.deliver(frame);
        }
        match completed {
            Some(frame) => {
                let broken = frame.is_broken();
                self.deliver(frame);
                IngestOutcome::Emitted { broken }
            }
            None => IngestOutcome::Pending,
        }
    }

    /// Destroy the state for `stream`, discarding any incomplete frame.
    ///
    /// Returns `true` if the stream had state.
    pub fn remove(&mut self, stream: StreamId) -> bool {
        let Some(mut state) = self.table.remove(stream) else {
            return false;
        };
        if let Some(bytes) = state.discard() {
            debug!(%stream, bytes, "discarding incomplete frame at stream close");
        }
        true
    }

    /// Number of streams with reassembly state.
    #[must_use]
    pub fn stream_count(&self) -> usize { self.table.len() }

    /// Borrow the state table.
    #[must_use]
    pub fn table(&self) -> &StreamTable { &self.table }

    fn dropped(stream: StreamId, fragment: &Fragment, reason: DropReason) -> IngestOutcome {
        debug!(
            %stream,
            frame_number = fragment.header().frame_number(),
            index = %fragment.header().index(),
            reason = reason.as_str(),
            "dropping fragment"
        );
        metrics::inc_fragments_dropped(reason.as_str());
        IngestOutcome::Dropped(reason)
    }

    fn deliver(&self, frame: Frame) {
        let stream = frame.source();
        let frame_number = frame.frame_number();
        metrics::inc_frames_delivered(frame.is_broken());
        let sink = &self.sink;
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| sink.deliver(frame))) {
            metrics::inc_sink_panics();
            let panic_msg = format_panic(panic);
            error!(panic = %panic_msg, %stream, frame_number, "frame sink panicked");
        }
    }
}
