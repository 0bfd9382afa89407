//! Errors raised by the [`Dispatcher`](super::Dispatcher).

use thiserror::Error;

/// Errors returned when handing work to the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher was shut down; no worker will accept the job.
    #[error("dispatcher is shut down")]
    Closed,
}
