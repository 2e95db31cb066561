//! Connection configuration options
//!
//! Options are applied by the transport when the socket is opened, before it
//! binds or connects, mirroring how libzmq socket options
//! (zmq_setsockopt) only affect later attachments.

use std::time::Duration;

/// Default high water mark, in messages, for both directions.
pub const DEFAULT_HWM: usize = 1000;

/// Default linger period applied when a connection is killed.
pub const DEFAULT_LINGER: Duration = Duration::from_secs(1);

/// Connection configuration options.
///
/// # Examples
///
/// ```
/// use linkmq_core::options::ConnectionOptions;
/// use std::time::Duration;
///
/// let opts = ConnectionOptions::default()
///     .with_send_hwm(64)
///     .with_recv_hwm(64)
///     .with_linger(Some(Duration::ZERO));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// High water mark for sending (ZMQ_SNDHWM)
    ///
    /// Maximum number of messages queued for sending. When reached, a send
    /// poll reports the socket as not writable (REQ) or messages are dropped
    /// (PUB), depending on the pattern.
    /// - Default: 1000 messages
    pub send_hwm: usize,

    /// High water mark for receiving (ZMQ_RCVHWM)
    ///
    /// Maximum number of messages queued for receiving.
    /// - Default: 1000 messages
    pub recv_hwm: usize,

    /// Linger timeout (ZMQ_LINGER)
    ///
    /// Time to keep undelivered outgoing messages after `kill_conn`.
    /// - `None`: Wait indefinitely
    /// - `Some(Duration::ZERO)`: Discard pending messages immediately
    /// - `Some(duration)`: Wait up to duration
    /// - Default: 1 second, so context teardown never hangs on a dead peer
    pub linger: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            send_hwm: DEFAULT_HWM,
            recv_hwm: DEFAULT_HWM,
            linger: Some(DEFAULT_LINGER),
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the send high water mark.
    ///
    /// A value of zero is raised to one; an unbounded queue is not offered.
    pub fn with_send_hwm(mut self, messages: usize) -> Self {
        self.send_hwm = messages.max(1);
        self
    }

    /// Set the receive high water mark.
    ///
    /// A value of zero is raised to one.
    pub fn with_recv_hwm(mut self, messages: usize) -> Self {
        self.recv_hwm = messages.max(1);
        self
    }

    /// Set the linger period.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// Linger encoded as libzmq milliseconds (`-1` = infinite).
    #[must_use]
    pub fn linger_millis(&self) -> i32 {
        match self.linger {
            None => -1,
            Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
        }
    }
}
