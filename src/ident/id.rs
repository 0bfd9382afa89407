use derive_more::{Display, Into};

use super::{FIRST_STREAM_ID, LAST_STREAM_ID};

/// Identifier naming one active connection's reassembly stream.
///
/// Only values in `[1, 254]` are representable; `0` and `255` are reserved.
///
/// # Examples
///
/// ```
/// use fragmux::ident::StreamId;
/// let id = StreamId::new(7).expect("7 is a valid identifier");
/// assert_eq!(id.get(), 7);
/// assert!(StreamId::new(0).is_none());
/// assert!(StreamId::new(255).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0}")]
pub struct StreamId(u8);

impl StreamId {
    /// Construct an identifier, rejecting the reserved values.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= FIRST_STREAM_ID && value <= LAST_STREAM_ID {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Return the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    pub(crate) const fn slot(self) -> usize { self.0 as usize }
}

impl TryFrom<u8> for StreamId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value).ok_or(value) }
}
