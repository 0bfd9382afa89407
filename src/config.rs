//! Engine configuration.
//!
//! [`EngineConfig`] collects the tunables shared by the dispatcher, the
//! reassembler and the identifier pool. Values are validated once, before any
//! task is spawned.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ident::MAX_STREAMS, reassembly::ReassemblyLimits};

/// Default cap on the number of dispatch workers.
pub const MAX_DEFAULT_WORKERS: usize = 8;
/// Default bound of each worker queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// Default upper bound for a reassembled frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;
/// Default upper bound for one fragment payload.
pub const DEFAULT_MAX_FRAGMENT_PAYLOAD: usize = 1456;

/// Errors reported by [`EngineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field that must be positive was zero.
    #[error("{field} must be at least 1")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
    /// More connections were requested than identifiers exist.
    #[error("max_connections {requested} exceeds the {limit} available identifiers")]
    TooManyConnections {
        /// Requested connection limit.
        requested: usize,
        /// Number of identifiers the pool can hand out.
        limit: usize,
    },
    /// A single fragment could exceed the frame limit.
    #[error("max_fragment_payload {fragment} exceeds max_frame_size {frame}")]
    FragmentLargerThanFrame {
        /// Configured fragment payload limit.
        fragment: usize,
        /// Configured frame size limit.
        frame: usize,
    },
}

/// Tunables for the reassembly engine.
///
/// # Examples
///
/// ```
/// use fragmux::config::EngineConfig;
///
/// let config = EngineConfig {
///     workers: 2,
///     ..EngineConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of dispatch workers, each owning one reassembly shard.
    pub workers: usize,
    /// Bound of each worker's job queue.
    pub queue_capacity: usize,
    /// Maximum number of simultaneously connected peers.
    pub max_connections: usize,
    /// Largest frame the reassembler will buffer.
    pub max_frame_size: usize,
    /// Largest payload accepted in a single fragment.
    pub max_fragment_payload: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map_or(1, NonZeroUsize::get)
            .min(MAX_DEFAULT_WORKERS);
        Self {
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_connections: MAX_STREAMS,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_fragment_payload: DEFAULT_MAX_FRAGMENT_PAYLOAD,
        }
    }
}

impl EngineConfig {
    /// Check that every field is within range.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("workers", self.workers),
            ("queue_capacity", self.queue_capacity),
            ("max_connections", self.max_connections),
            ("max_frame_size", self.max_frame_size),
            ("max_fragment_payload", self.max_fragment_payload),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.max_connections > MAX_STREAMS {
            return Err(ConfigError::TooManyConnections {
                requested: self.max_connections,
                limit: MAX_STREAMS,
            });
        }
        if self.max_fragment_payload > self.max_frame_size {
            return Err(ConfigError::FragmentLargerThanFrame {
                fragment: self.max_fragment_payload,
                frame: self.max_frame_size,
            });
        }
        Ok(())
    }

    /// Size limits handed to each reassembler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] if either size limit is zero.
    pub fn limits(&self) -> Result<ReassemblyLimits, ConfigError> {
        let max_frame_size = NonZeroUsize::new(self.max_frame_size).ok_or(ConfigError::Zero {
            field: "max_frame_size",
        })?;
        let max_fragment_payload =
            NonZeroUsize::new(self.max_fragment_payload).ok_or(ConfigError::Zero {
                field: "max_fragment_payload",
            })?;
        Ok(ReassemblyLimits {
            max_frame_size,
            max_fragment_payload,
        })
    }
}
