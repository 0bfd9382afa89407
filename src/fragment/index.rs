//! Zero-based fragment positioning within a frame.

use bincode::{Decode, Encode};
use derive_more::{Display, From};

/// Zero-based ordinal describing a fragment's position within its frame.
///
/// # Examples
///
/// ```
/// use fragmux::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert_eq!(index.checked_increment(), Some(FragmentIndex::new(4)));
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display, From,
)]
#[display("{_0}")]
pub struct FragmentIndex(u16);

impl FragmentIndex {
    /// Construct an index from a `u16` value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Increment the index, returning `None` on overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}

impl From<FragmentIndex> for u16 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
