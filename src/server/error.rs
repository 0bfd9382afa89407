//! Errors raised by [`FrameServer`](super::FrameServer) operations.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that may occur while building or starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or configuring the listener failed.
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
    /// The engine configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
