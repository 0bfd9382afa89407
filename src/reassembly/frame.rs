//! Reassembled frames handed to the consumer.

use bytes::Bytes;

use crate::{fragment::ContentType, ident::StreamId};

/// A reassembled frame.
///
/// Frames are delivered even when fragments were lost, reordered or cut
/// short by the size limit; [`Frame::is_broken`] tells the consumer the
/// payload cannot be trusted byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub(crate) payload: Bytes,
    pub(crate) pts: Option<u64>,
    pub(crate) broken: bool,
    pub(crate) source: StreamId,
    pub(crate) content: ContentType,
    pub(crate) frame_number: u16,
}

impl Frame {
    /// Borrow the frame payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the frame, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> usize { self.payload.len() }

    /// Presentation timestamp, if any fragment carried one.
    #[must_use]
    pub const fn pts(&self) -> Option<u64> { self.pts }

    /// Report whether loss, reordering or truncation was detected.
    #[must_use]
    pub const fn is_broken(&self) -> bool { self.broken }

    /// Stream the frame was received on.
    #[must_use]
    pub const fn source(&self) -> StreamId { self.source }

    /// Content tag recorded for the frame.
    #[must_use]
    pub const fn content(&self) -> ContentType { self.content }

    /// Sender-assigned frame number.
    #[must_use]
    pub const fn frame_number(&self) -> u16 { self.frame_number }
}
