//! Readiness poll timeouts.
//!
//! Send and receive take a signed millisecond timeout:
//!
//! - `-1` (any negative value): block until the socket is ready
//! - `0`: return immediately if the socket is not ready
//! - `N > 0`: wait up to `N` milliseconds
//!
//! [`PollTimeout`] is the decoded form handed to the transport.

use std::time::{Duration, Instant};

/// How long a readiness poll may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTimeout {
    /// Block until ready
    Forever,
    /// Do not wait at all
    Immediate,
    /// Wait up to the given duration
    Bounded(Duration),
}

impl PollTimeout {
    /// Decode a signed millisecond timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkmq_core::timeout::PollTimeout;
    /// use std::time::Duration;
    ///
    /// assert_eq!(PollTimeout::from_millis(-1), PollTimeout::Forever);
    /// assert_eq!(PollTimeout::from_millis(0), PollTimeout::Immediate);
    /// assert_eq!(
    ///     PollTimeout::from_millis(250),
    ///     PollTimeout::Bounded(Duration::from_millis(250))
    /// );
    /// ```
    #[must_use]
    pub fn from_millis(timeout_ms: i32) -> Self {
        match timeout_ms {
            ms if ms < 0 => Self::Forever,
            0 => Self::Immediate,
            ms => Self::Bounded(Duration::from_millis(ms as u64)),
        }
    }

    /// Encode as the millisecond value `zmq_poll` expects.
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        match self {
            Self::Forever => -1,
            Self::Immediate => 0,
            Self::Bounded(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX).max(1),
        }
    }

    /// Absolute deadline for this timeout, starting now.
    ///
    /// `None` means there is no deadline.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Forever => None,
            Self::Immediate => Some(Instant::now()),
            Self::Bounded(d) => Some(Instant::now() + *d),
        }
    }

    /// Returns true if the poll must not wait.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate)
    }
}

impl From<Option<Duration>> for PollTimeout {
    /// `None` blocks, `Some(Duration::ZERO)` is non-blocking.
    fn from(value: Option<Duration>) -> Self {
        match value {
            None => Self::Forever,
            Some(d) if d.is_zero() => Self::Immediate,
            Some(d) => Self::Bounded(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_values_block() {
        assert_eq!(PollTimeout::from_millis(-1), PollTimeout::Forever);
        assert_eq!(PollTimeout::from_millis(i32::MIN), PollTimeout::Forever);
    }

    #[test]
    fn test_millis_encoding() {
        assert_eq!(PollTimeout::Forever.as_millis(), -1);
        assert_eq!(PollTimeout::Immediate.as_millis(), 0);
        assert_eq!(PollTimeout::from_millis(1500).as_millis(), 1500);
        // Sub-millisecond bounded waits must not collapse into non-blocking
        assert_eq!(PollTimeout::Bounded(Duration::from_micros(10)).as_millis(), 1);
    }

    #[test]
    fn test_from_option_duration() {
        assert_eq!(PollTimeout::from(None), PollTimeout::Forever);
        assert_eq!(PollTimeout::from(Some(Duration::ZERO)), PollTimeout::Immediate);
        assert_eq!(
            PollTimeout::from(Some(Duration::from_secs(2))),
            PollTimeout::Bounded(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_deadline() {
        assert!(PollTimeout::Forever.deadline().is_none());
        let before = Instant::now();
        let deadline = PollTimeout::from_millis(50).deadline().unwrap();
        assert!(deadline >= before + Duration::from_millis(50));
    }
}
