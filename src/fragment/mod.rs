//! Fragment primitives delivered by the transport.
//!
//! A [`Fragment`] is one chunk of a frame plus the [`FragmentHeader`] that
//! says where it belongs. The codec helpers turn fragment records on the
//! wire into headers and payload slices.

pub mod codec;
pub mod error;
pub mod header;
pub mod index;
pub mod packet;

pub use codec::{FRAGMENT_MAGIC, decode_fragment, encode_fragment, fragment_overhead};
pub use error::FragmentCodecError;
pub use header::{ContentType, FragmentHeader};
pub use index::FragmentIndex;
pub use packet::Fragment;
