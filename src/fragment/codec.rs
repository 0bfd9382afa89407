//! Wire encoding of a single fragment record.
//!
//! Each record carries a short magic marker, a length-prefixed bincode
//! [`FragmentHeader`], and finally the raw fragment bytes:
//! `[FRAGMENT_MAGIC][u16 header_len][header bytes][fragment payload]`.
//! Record boundaries are the transport's business; the TCP server wraps each
//! record in a length-delimited frame.

use std::num::NonZeroUsize;

use bincode::{
    config,
    decode_from_slice,
    encode_to_vec,
    error::EncodeError,
};

use super::{ContentType, FragmentCodecError, FragmentHeader, FragmentIndex};

/// Magic prefix that marks a fragment record.
pub const FRAGMENT_MAGIC: &[u8; 4] = b"EFPF";

const LEN_PREFIX: usize = std::mem::size_of::<u16>();

/// Upper bound on the non-payload bytes of an encoded record.
///
/// bincode encodes integers as varints, so the bound is computed from a
/// header whose every field takes its widest form.
///
/// # Panics
///
/// Panics if encoding the constant header fails, which would indicate a
/// programmer error in the header definition.
#[must_use]
pub fn fragment_overhead() -> NonZeroUsize {
    let header = FragmentHeader::new(u16::MAX, FragmentIndex::new(u16::MAX), u32::MAX)
        .with_total_size(u32::MAX)
        .with_pts(u64::MAX)
        .with_content(ContentType::new(u8::MAX))
        .last();
    let header_bytes = encode_to_vec(header, config::standard()).unwrap_or_else(|err| {
        panic!("fragment header encoding must be infallible for constants: {err}")
    });
    let overhead = FRAGMENT_MAGIC.len() + LEN_PREFIX + header_bytes.len();
    NonZeroUsize::new(overhead).unwrap_or_else(|| {
        panic!("fragment overhead must be non-zero (computed {overhead})");
    })
}

/// Encode a fragment record.
///
/// # Errors
///
/// Returns an [`EncodeError`] if the header cannot be encoded.
pub fn encode_fragment(header: FragmentHeader, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let header_bytes = encode_to_vec(header, config::standard())?;
    let header_len = u16::try_from(header_bytes.len())
        .map_err(|_| EncodeError::Other("fragment header length must fit within u16::MAX"))?;

    let mut buf = Vec::with_capacity(
        FRAGMENT_MAGIC.len() + LEN_PREFIX + header_bytes.len() + payload.len(),
    );
    buf.extend_from_slice(FRAGMENT_MAGIC);
    buf.extend_from_slice(&header_len.to_be_bytes());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decode a fragment record into its header and a borrowed payload.
///
/// # Errors
///
/// Returns [`FragmentCodecError`] when the marker is absent, the record is
/// truncated, or the header bytes are malformed.
pub fn decode_fragment(record: &[u8]) -> Result<(FragmentHeader, &[u8]), FragmentCodecError> {
    let Some(prefix) = record.get(..FRAGMENT_MAGIC.len()) else {
        return Err(FragmentCodecError::MissingMagic);
    };
    if prefix != FRAGMENT_MAGIC {
        return Err(FragmentCodecError::MissingMagic);
    }

    let len_offset = FRAGMENT_MAGIC.len();
    let header_start = len_offset + LEN_PREFIX;
    let Some(&[hi, lo]) = record.get(len_offset..header_start) else {
        return Err(FragmentCodecError::Truncated {
            needed: header_start - record.len(),
        });
    };
    let header_len = usize::from(u16::from_be_bytes([hi, lo]));
    let header_end = header_start + header_len;

    let Some(header_bytes) = record.get(header_start..header_end) else {
        return Err(FragmentCodecError::Truncated {
            needed: header_end.saturating_sub(record.len()),
        });
    };

    let (header, consumed) =
        decode_from_slice::<FragmentHeader, _>(header_bytes, config::standard())?;
    if consumed != header_len {
        return Err(FragmentCodecError::HeaderLengthMismatch {
            advertised: header_len,
            consumed,
        });
    }

    let payload = record.get(header_end..).unwrap_or_default();
    Ok((header, payload))
}
