//! Consumer contract for completed frames.

use super::Frame;

/// Receives every frame the reassembler completes.
///
/// `deliver` runs on a dispatch worker. Blocking it stalls every stream
/// routed to that worker, so implementations should hand the frame off
/// (to a channel, a decoder task, ...) rather than process it inline.
///
/// Closures taking a [`Frame`] implement the trait:
///
/// ```
/// use fragmux::reassembly::{Frame, FrameSink};
/// let sink = |frame: Frame| println!("{} bytes", frame.size());
/// fn assert_sink(_: &impl FrameSink) {}
/// assert_sink(&sink);
/// ```
pub trait FrameSink: Send + Sync + 'static {
    /// Take ownership of one frame.
    fn deliver(&self, frame: Frame);
}

impl<F> FrameSink for F
where
    F: Fn(Frame) + Send + Sync + 'static,
{
    fn deliver(&self, frame: Frame) { self(frame) }
}
