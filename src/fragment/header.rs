use bincode::{Decode, Encode};
use derive_more::{Display, From, Into};

use super::FragmentIndex;

/// Opaque tag describing the payload carried by a frame.
///
/// The reassembly engine never interprets the tag; it records the first
/// value seen for a frame and hands it to the consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode, Display, From, Into)]
#[display("{_0:#04x}")]
pub struct ContentType(u8);

impl ContentType {
    /// Tag used when the sender does not classify its payload.
    pub const UNSPECIFIED: Self = Self(0);

    /// Create a tag from its raw value.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the raw tag value.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}

/// Transport metadata describing where a fragment belongs.
///
/// Headers are small enough to copy by value. Optional fields are recorded
/// the first time the reassembler sees them for a frame; later fragments may
/// omit them.
///
/// # Examples
///
/// ```
/// use fragmux::fragment::{FragmentHeader, FragmentIndex};
/// let header = FragmentHeader::new(7, FragmentIndex::zero(), 0)
///     .with_total_size(150)
///     .with_pts(1000);
/// assert_eq!(header.frame_number(), 7);
/// assert_eq!(header.total_size(), Some(150));
/// assert!(!header.is_last());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct FragmentHeader {
    frame_number: u16,
    index: FragmentIndex,
    offset: u32,
    total_size: Option<u32>,
    pts: Option<u64>,
    content: ContentType,
    is_last: bool,
}

impl FragmentHeader {
    /// Create a header for the fragment at `index`, written at byte `offset`
    /// of frame `frame_number`.
    #[must_use]
    pub const fn new(frame_number: u16, index: FragmentIndex, offset: u32) -> Self {
        Self {
            frame_number,
            index,
            offset,
            total_size: None,
            pts: None,
            content: ContentType::UNSPECIFIED,
            is_last: false,
        }
    }

    /// Declare the size of the complete frame.
    #[must_use]
    pub const fn with_total_size(mut self, total_size: u32) -> Self {
        self.total_size = Some(total_size);
        self
    }

    /// Attach the frame's presentation timestamp.
    #[must_use]
    pub const fn with_pts(mut self, pts: u64) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Attach the frame's content tag.
    #[must_use]
    pub const fn with_content(mut self, content: ContentType) -> Self {
        self.content = content;
        self
    }

    /// Mark this fragment as the final one of its frame.
    #[must_use]
    pub const fn last(mut self) -> Self {
        self.is_last = true;
        self
    }

    /// Sender-assigned number of the frame this fragment belongs to.
    #[must_use]
    pub const fn frame_number(&self) -> u16 { self.frame_number }

    /// Position of the fragment within its frame.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }

    /// Byte offset of the fragment payload within the frame.
    #[must_use]
    pub const fn offset(&self) -> u32 { self.offset }

    /// Declared size of the whole frame, if the sender provided it.
    #[must_use]
    pub const fn total_size(&self) -> Option<u32> { self.total_size }

    /// Presentation timestamp, if the sender provided it.
    #[must_use]
    pub const fn pts(&self) -> Option<u64> { self.pts }

    /// Content tag of the frame.
    #[must_use]
    pub const fn content(&self) -> ContentType { self.content }

    /// Report whether this is the final fragment.
    #[must_use]
    pub const fn is_last(&self) -> bool { self.is_last }
}
