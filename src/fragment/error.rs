//! Errors raised while decoding fragment records off the wire.

use bincode::error::DecodeError;
use thiserror::Error;

/// Failure to decode one fragment record.
///
/// A decode failure is local to the record and the connection that sent it;
/// it never reaches the reassembly engine.
#[derive(Debug, Error)]
pub enum FragmentCodecError {
    /// The record does not start with [`FRAGMENT_MAGIC`](super::FRAGMENT_MAGIC).
    #[error("fragment record is missing its magic prefix")]
    MissingMagic,
    /// The record ended before the advertised header.
    #[error("fragment record truncated: {needed} more bytes required")]
    Truncated { needed: usize },
    /// The header decoded from fewer bytes than it advertised.
    #[error("fragment header length mismatch: advertised {advertised}, consumed {consumed}")]
    HeaderLengthMismatch { advertised: usize, consumed: usize },
    /// The header bytes could not be decoded.
    #[error("failed to decode fragment header: {0}")]
    Header(#[from] DecodeError),
}
