//! Back-off configuration for the server accept loop.

use std::time::Duration;

/// Exponential back-off applied when `accept()` fails.
///
/// The delay starts at `initial_delay`, doubles after every consecutive
/// failure and never exceeds `max_delay`. A successful accept resets it.
///
/// Defaults: 10 ms initial, 1 s maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay used for the first retry after an `accept()` failure.
    pub initial_delay: Duration,
    /// Upper bound for the retry delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Clamp both delays to at least 1 ms and order them so that
    /// `initial_delay <= max_delay`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use fragmux::server::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::ZERO,
    /// }
    /// .normalized();
    /// assert_eq!(cfg.initial_delay, Duration::from_millis(1));
    /// assert_eq!(cfg.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let floor = Duration::from_millis(1);
        self.initial_delay = self.initial_delay.max(floor);
        self.max_delay = self.max_delay.max(floor);
        if self.initial_delay > self.max_delay {
            std::mem::swap(&mut self.initial_delay, &mut self.max_delay);
        }
        self
    }
}

/// Retry delay of one accept loop.
///
/// Each failure yields the current delay and doubles the next one up to
/// `max_delay`; a successful accept resets it to `initial_delay`.
#[derive(Clone, Copy, Debug)]
pub(super) struct AcceptBackoff {
    config: BackoffConfig,
    next: Duration,
}

impl AcceptBackoff {
    pub(super) fn new(config: BackoffConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            next: config.initial_delay,
        }
    }

    /// Delay to sleep after a failed accept.
    pub(super) fn after_failure(&mut self) -> Duration {
        let delay = self.next;
        self.next = delay.saturating_mul(2).min(self.config.max_delay);
        delay
    }

    pub(super) fn reset(&mut self) { self.next = self.config.initial_delay; }
}
