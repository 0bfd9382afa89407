//! Fragments as they travel from the transport to the reassembler.

use bytes::Bytes;

use super::FragmentHeader;
use crate::ident::StreamId;

/// One transport-delivered chunk of a frame, tagged with its stream.
///
/// Fragments are immutable and consumed by the reassembler; the payload is
/// reference counted so handing one to a worker never copies the bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    stream: StreamId,
    header: FragmentHeader,
    payload: Bytes,
}

impl Fragment {
    /// Tag `payload` with the stream it arrived on.
    #[must_use]
    pub fn new(stream: StreamId, header: FragmentHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            header,
            payload: payload.into(),
        }
    }

    /// Stream the fragment arrived on.
    #[must_use]
    pub const fn stream(&self) -> StreamId { self.stream }

    /// Transport metadata for the fragment.
    #[must_use]
    pub const fn header(&self) -> &FragmentHeader { &self.header }

    /// Borrow the fragment payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.payload.len() }

    /// Report whether the fragment carries no payload.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.payload.is_empty() }
}
