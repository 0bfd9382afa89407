//! Per-stream reassembly state machine.
//!
//! A [`StreamState`] tracks at most one frame in progress. Fragments are
//! written at their declared offset; anything that breaks the expected
//! index/offset sequence marks the frame broken instead of discarding it.

use std::num::NonZeroUsize;

use bytes::Bytes;

use super::Frame;
use crate::{
    fragment::{ContentType, Fragment, FragmentHeader, FragmentIndex},
    ident::StreamId,
};

/// Size bounds enforced while reassembling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyLimits {
    /// Largest frame the reassembler will buffer.
    pub max_frame_size: NonZeroUsize,
    /// Largest payload a single fragment may carry.
    pub max_fragment_payload: NonZeroUsize,
}

/// Where an incoming fragment belongs relative to a stream's frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The fragment extends the frame in progress, or opens a new one when
    /// none is in progress.
    Current,
    /// The fragment opens a frame numbered after the one in progress, which
    /// must be finalized first.
    Newer,
    /// The fragment belongs to a frame already emitted or superseded.
    Late,
}

/// Half of the `u16` frame number space; numbers less than this far ahead
/// of a reference are newer, the rest are older.
const NEWER_WINDOW: u16 = 1 << 15;

/// Report whether `candidate` follows `reference` in wrapping frame order.
fn is_newer(candidate: u16, reference: u16) -> bool {
    candidate != reference && candidate.wrapping_sub(reference) < NEWER_WINDOW
}

/// Result of feeding a fragment into a [`StreamState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Absorb {
    /// The frame still expects more fragments.
    Pending,
    /// The fragment completed the frame.
    Complete,
    /// The fragment would push the frame past the size limits; it was not
    /// written and the frame must be finalized as broken.
    Oversized,
}

#[derive(Debug)]
struct PartialFrame {
    frame_number: u16,
    buffer: Vec<u8>,
    written: usize,
    declared_size: Option<usize>,
    pts: Option<u64>,
    content: ContentType,
    next_index: Option<FragmentIndex>,
    next_offset: usize,
    broken: bool,
}

impl PartialFrame {
    fn start(header: &FragmentHeader, limits: ReassemblyLimits) -> Self {
        let capacity = header
            .total_size()
            .and_then(|total| usize::try_from(total).ok())
            .filter(|total| *total <= limits.max_frame_size.get())
            .unwrap_or_default();
        Self {
            frame_number: header.frame_number(),
            buffer: Vec::with_capacity(capacity),
            written: 0,
            declared_size: None,
            pts: None,
            content: header.content(),
            next_index: Some(FragmentIndex::zero()),
            next_offset: 0,
            broken: false,
        }
    }

    fn absorb(
        &mut self,
        header: &FragmentHeader,
        payload: &[u8],
        limits: ReassemblyLimits,
    ) -> Absorb {
        let max = limits.max_frame_size.get();
        if self.pts.is_none() {
            self.pts = header.pts();
        }
        if self.declared_size.is_none()
            && let Some(total) = header.total_size()
        {
            let total = usize::try_from(total).unwrap_or(usize::MAX);
            if total > max {
                return Absorb::Oversized;
            }
            self.declared_size = Some(total);
        }
        if payload.len() > limits.max_fragment_payload.get() {
            return Absorb::Oversized;
        }

        let offset = usize::try_from(header.offset()).unwrap_or(usize::MAX);
        let Some(end) = offset.checked_add(payload.len()).filter(|end| *end <= max) else {
            return Absorb::Oversized;
        };

        if self.next_index != Some(header.index()) || offset != self.next_offset {
            self.broken = true;
        }
        if self.declared_size.is_some_and(|total| end > total) {
            self.broken = true;
        }
        if end > self.buffer.len() {
            self.buffer.reserve_exact(end - self.buffer.len());
            self.buffer.resize(end, 0);
        }
        if let Some(slot) = self.buffer.get_mut(offset..end) {
            slot.copy_from_slice(payload);
        }
        self.written = self.written.saturating_add(payload.len());
        self.next_index = header.index().checked_increment();
        self.next_offset = end;

        let filled = self.declared_size.is_some_and(|total| self.written >= total);
        if header.is_last() || filled {
            Absorb::Complete
        } else {
            Absorb::Pending
        }
    }

    fn into_frame(self, source: StreamId, truncated: bool) -> Frame {
        let short = self
            .declared_size
            .is_some_and(|total| self.buffer.len() != total);
        Frame {
            payload: Bytes::from(self.buffer),
            pts: self.pts,
            broken: self.broken || truncated || short,
            source,
            content: self.content,
            frame_number: self.frame_number,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Emitted {
    frame_number: u16,
    broken: bool,
}

/// Reassembly state for one stream.
#[derive(Debug, Default)]
pub struct StreamState {
    current: Option<PartialFrame>,
    last_emitted: Option<Emitted>,
}

impl StreamState {
    /// Frame number of the frame being assembled, if any.
    #[must_use]
    pub fn in_progress(&self) -> Option<u16> { self.current.as_ref().map(|f| f.frame_number) }

    /// Bytes buffered for the frame in progress.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.current.as_ref().map_or(0, |f| f.buffer.len()) }

    /// Decide where a fragment carrying `header` belongs.
    ///
    /// Frame numbers are compared in wrapping order. While a frame is in
    /// progress, older numbers are late and newer ones supersede it. With no
    /// frame in progress, the number of the frame emitted last opens a new
    /// frame unless that frame was finalized broken and the fragment is not
    /// its first; such fragments are stragglers of the emitted frame.
    #[must_use]
    pub fn place(&self, header: &FragmentHeader) -> Placement {
        let number = header.frame_number();
        if let Some(current) = &self.current {
            return if number == current.frame_number {
                Placement::Current
            } else if is_newer(number, current.frame_number) {
                Placement::Newer
            } else {
                Placement::Late
            };
        }
        match self.last_emitted {
            Some(last) if number == last.frame_number => {
                if last.broken && header.index() != FragmentIndex::zero() {
                    Placement::Late
                } else {
                    Placement::Current
                }
            }
            Some(last) if !is_newer(number, last.frame_number) => Placement::Late,
            _ => Placement::Current,
        }
    }

    /// Feed a fragment into the frame in progress, starting one if needed.
    pub fn absorb(&mut self, fragment: &Fragment, limits: ReassemblyLimits) -> Absorb {
        let header = fragment.header();
        self.current
            .get_or_insert_with(|| PartialFrame::start(header, limits))
            .absorb(header, fragment.payload(), limits)
    }

    /// Finalize the frame in progress and reset for the next one.
    ///
    /// `truncated` forces the broken flag, for frames cut short by the size
    /// limit or superseded by a newer frame number.
    pub fn finish(&mut self, source: StreamId, truncated: bool) -> Option<Frame> {
        let frame = self.current.take()?.into_frame(source, truncated);
        self.last_emitted = Some(Emitted {
            frame_number: frame.frame_number,
            broken: frame.broken,
        });
        Some(frame)
    }

    /// Drop the frame in progress, returning the number of bytes discarded.
    pub fn discard(&mut self) -> Option<usize> {
        self.current.take().map(|partial| partial.buffer.len())
    }
}
