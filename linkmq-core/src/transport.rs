//! The transport primitive a connection drives.
//!
//! A [`Transport`] is the narrow interface between the connection state
//! machine and whatever actually moves bytes: it creates a context, opens
//! sockets of a requested pattern, binds or connects them, polls readiness
//! and performs single-message transfers.
//!
//! Implementations:
//! - [`InprocTransport`](crate::inproc::InprocTransport): in-process channels
//! - `linkmq_zmq::ZmqTransport`: libzmq
//!
//! Test code can provide its own implementation to count or fail calls.

use crate::error::TransportError;
use crate::options::ConnectionOptions;
use crate::socket_type::SocketType;
use crate::timeout::PollTimeout;

/// Readiness a poll waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// At least one message can be received without blocking
    Readable,
    /// At least one message can be queued without blocking
    Writable,
}

/// Narrow transport interface used by [`Connection`](crate::connection::Connection).
///
/// Socket methods take `&mut Self::Socket`: a socket is owned by exactly one
/// connection and is never shared.
pub trait Transport: Send + Sync + 'static {
    /// Shared context handle. Cloning must be cheap.
    type Context: Clone + Send + Sync + 'static;

    /// Socket handle.
    type Socket: Send + 'static;

    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Create a new context.
    fn create_context(&self) -> Result<Self::Context, TransportError>;

    /// Tear down a context. Called only once no connection uses it.
    fn destroy_context(&self, context: Self::Context);

    /// Open a socket of the given pattern and apply `options` to it.
    fn open(
        &self,
        context: &Self::Context,
        socket_type: SocketType,
        options: &ConnectionOptions,
    ) -> Result<Self::Socket, TransportError>;

    /// Listen on `endpoint`.
    fn bind(&self, socket: &mut Self::Socket, endpoint: &str) -> Result<(), TransportError>;

    /// Dial `endpoint`.
    fn connect(&self, socket: &mut Self::Socket, endpoint: &str) -> Result<(), TransportError>;

    /// Install a prefix subscription on a SUB socket. An empty prefix matches
    /// every message.
    fn subscribe(&self, socket: &mut Self::Socket, prefix: &[u8]) -> Result<(), TransportError>;

    /// Wait for readiness.
    ///
    /// Returns `Ok(true)` when ready and `Ok(false)` when the timeout elapsed.
    /// A poll cut short by a signal fails with an error whose
    /// [`is_interrupted`](TransportError::is_interrupted) is true.
    fn poll(
        &self,
        socket: &mut Self::Socket,
        interest: Interest,
        timeout: PollTimeout,
    ) -> Result<bool, TransportError>;

    /// Queue exactly one message. Returns the number of bytes queued.
    fn send(&self, socket: &mut Self::Socket, buf: &[u8]) -> Result<usize, TransportError>;

    /// Receive exactly one message into `buf`.
    ///
    /// A message longer than `buf` is truncated; the return value is always
    /// the original message length.
    fn recv(&self, socket: &mut Self::Socket, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Close a socket.
    fn close(&self, socket: Self::Socket);
}
