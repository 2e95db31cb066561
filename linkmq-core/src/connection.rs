//! Connection state machine and data transfer protocol.
//!
//! A [`Connection`] is one logical endpoint: a connection string, a
//! [`ConnectionRole`] and at most one live socket. It moves through
//!
//! ```text
//! Uninitialized ──init_conn──▶ Open ──kill_conn──▶ Closed
//! ```
//!
//! `Closed` is terminal; reconnecting means constructing a new connection.
//!
//! # Timeouts
//!
//! [`send`](Connection::send) and [`receive`](Connection::receive) poll the
//! socket for readiness before touching it, so one signed millisecond timeout
//! expresses all three modes:
//!
//! - `-1`: block until ready
//! - `0`: return `Ok(0)` at once if not ready
//! - `N`: wait up to `N` ms, then return `Ok(0)`
//!
//! A poll interrupted by a signal also yields `Ok(0)`; callers already loop on
//! the timeout case and retry the same way.
//!
//! # Example
//!
//! ```rust
//! use linkmq_core::connection::Connection;
//! use linkmq_core::context::SharedContext;
//! use linkmq_core::inproc::InprocTransport;
//! use std::sync::Arc;
//!
//! # fn example() -> linkmq_core::error::Result<()> {
//! let shared = Arc::new(SharedContext::new(InprocTransport::new()));
//!
//! let mut server = Connection::server("inproc://doc-echo", Arc::clone(&shared));
//! server.init_conn()?;
//! let mut client = Connection::client("inproc://doc-echo", Arc::clone(&shared));
//! client.init_conn()?;
//!
//! client.send(b"Hello server", -1)?;
//! let mut buf = [0u8; 64];
//! let n = server.receive(&mut buf, 1000)?;
//! assert_eq!(&buf[..n], b"Hello server");
//!
//! server.send(b"Hello client", -1)?;
//! let n = client.receive(&mut buf, 1000)?;
//! assert_eq!(&buf[..n], b"Hello client");
//!
//! client.kill_conn()?;
//! server.kill_conn()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::context::SharedContext;
use crate::error::{LinkError, Operation, Result, TransportError};
use crate::options::ConnectionOptions;
use crate::role::{Attach, ConnectionRole, RoleProfile};
use crate::timeout::PollTimeout;
use crate::transport::{Interest, Transport};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Observable lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, `init_conn` not yet called (or it failed)
    Uninitialized,
    /// Socket open
    Open,
    /// `kill_conn` called; terminal
    Closed,
}

enum State<S> {
    Uninitialized,
    Open(S),
    Closed,
}

/// One messaging endpoint over a transport `T`.
///
/// Not internally synchronized: all operations take `&mut self`, so a
/// connection is used by one thread at a time. Move it to another thread if
/// needed; share it behind a lock if you must.
pub struct Connection<T: Transport> {
    connection_string: String,
    role: ConnectionRole,
    options: ConnectionOptions,
    shared: Arc<SharedContext<T>>,
    state: State<T::Socket>,
}

impl<T: Transport> Connection<T> {
    /// Create a connection. Nothing is opened until [`init_conn`](Self::init_conn).
    ///
    /// The connection string is passed to the transport untouched.
    pub fn new(
        connection_string: impl Into<String>,
        role: ConnectionRole,
        shared: Arc<SharedContext<T>>,
    ) -> Self {
        Self::with_options(connection_string, role, shared, ConnectionOptions::default())
    }

    /// Create a connection with explicit socket options.
    pub fn with_options(
        connection_string: impl Into<String>,
        role: ConnectionRole,
        shared: Arc<SharedContext<T>>,
        options: ConnectionOptions,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            role,
            options,
            shared,
            state: State::Uninitialized,
        }
    }

    /// Create a Server (binds, receive then send).
    pub fn server(connection_string: impl Into<String>, shared: Arc<SharedContext<T>>) -> Self {
        Self::new(connection_string, ConnectionRole::Server, shared)
    }

    /// Create a Client (connects, send then receive).
    pub fn client(connection_string: impl Into<String>, shared: Arc<SharedContext<T>>) -> Self {
        Self::new(connection_string, ConnectionRole::Client, shared)
    }

    /// Create a Publisher (binds, send only).
    pub fn publisher(connection_string: impl Into<String>, shared: Arc<SharedContext<T>>) -> Self {
        Self::new(connection_string, ConnectionRole::Publisher, shared)
    }

    /// Create a Subscriber (connects, receive only, all topics).
    pub fn subscriber(connection_string: impl Into<String>, shared: Arc<SharedContext<T>>) -> Self {
        Self::new(connection_string, ConnectionRole::Subscriber, shared)
    }

    /// The connection string this connection binds or connects to.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Role of this connection.
    pub fn role(&self) -> ConnectionRole {
        self.role
    }

    /// Socket options applied at `init_conn`.
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Shared context this connection draws from.
    pub fn shared_context(&self) -> &Arc<SharedContext<T>> {
        &self.shared
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match self.state {
            State::Uninitialized => ConnectionState::Uninitialized,
            State::Open(_) => ConnectionState::Open,
            State::Closed => ConnectionState::Closed,
        }
    }

    /// Returns true while a socket is open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Open the socket and bind or connect it.
    ///
    /// # Errors
    ///
    /// - [`LinkError::AlreadyInitialized`] if the connection is open
    /// - [`LinkError::Closed`] if the connection was killed
    /// - [`LinkError::Transport`] if the context, socket, bind, connect or
    ///   subscription fails. The connection stays uninitialized and may be
    ///   retried.
    pub fn init_conn(&mut self) -> Result<()> {
        match self.state {
            State::Uninitialized => {}
            State::Open(_) => return Err(LinkError::AlreadyInitialized { role: self.role }),
            State::Closed => return Err(LinkError::Closed { role: self.role }),
        }

        let role = self.role;
        let profile = role.profile();
        let transport_err = |e: TransportError| LinkError::transport(Operation::InitConn, role, e);

        let context = self.shared.acquire().map_err(transport_err)?;
        let opened = self.open_socket(&context, profile);
        drop(context);

        match opened {
            Ok(socket) => {
                self.state = State::Open(socket);
                debug!(
                    "[{}] Initialized {} socket on {} via {}",
                    self.role,
                    profile.socket_type,
                    self.connection_string,
                    self.shared.transport().name()
                );
                Ok(())
            }
            Err(e) => {
                self.shared.release();
                Err(transport_err(e))
            }
        }
    }

    fn open_socket(
        &self,
        context: &T::Context,
        profile: RoleProfile,
    ) -> std::result::Result<T::Socket, TransportError> {
        let transport = self.shared.transport();
        let mut socket = transport.open(context, profile.socket_type, &self.options)?;

        let attached = match profile.attach {
            Attach::Bind => transport.bind(&mut socket, &self.connection_string),
            Attach::Connect => transport.connect(&mut socket, &self.connection_string),
        }
        .and_then(|()| {
            if profile.subscribe_all {
                // Don't filter anything
                transport.subscribe(&mut socket, b"")
            } else {
                Ok(())
            }
        });

        match attached {
            Ok(()) => Ok(socket),
            Err(e) => {
                transport.close(socket);
                Err(e)
            }
        }
    }

    /// Close the socket and release the shared context.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotInitialized`] unless the connection is open.
    pub fn kill_conn(&mut self) -> Result<()> {
        let socket = match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(socket) => socket,
            previous => {
                self.state = previous;
                return Err(LinkError::NotInitialized {
                    op: Operation::KillConn,
                    role: self.role,
                });
            }
        };

        self.shared.transport().close(socket);
        self.shared.release();
        debug!("[{}] Closed connection on {}", self.role, self.connection_string);
        Ok(())
    }

    /// Queue one message.
    ///
    /// Returns the number of bytes queued, or `0` if the socket did not become
    /// writable within `timeout_ms` (or the wait was interrupted). Queued does
    /// not mean delivered.
    ///
    /// # Errors
    ///
    /// - [`LinkError::RoleViolation`] for a Subscriber, before any transport call
    /// - [`LinkError::NotInitialized`] unless the connection is open
    /// - [`LinkError::Transport`] for any other transport failure
    pub fn send(&mut self, buf: &[u8], timeout_ms: i32) -> Result<usize> {
        let role = self.role;
        permit(role, Operation::Send)?;
        let socket = open_socket_mut(&mut self.state, Operation::Send, role)?;
        let transport = self.shared.transport();

        if !poll_ready(transport, socket, Interest::Writable, timeout_ms, role)? {
            return Ok(0);
        }

        let sent = transport
            .send(socket, buf)
            .map_err(|e| LinkError::transport(Operation::Send, role, e))?;
        trace!("[{}] Queued {} bytes", role, sent);
        Ok(sent)
    }

    /// Receive one message into `buf`.
    ///
    /// Returns the length of the received message, which is larger than
    /// `buf.len()` when the message was truncated to fit. Returns `0` if no
    /// message became ready within `timeout_ms` (or the wait was interrupted).
    ///
    /// # Errors
    ///
    /// - [`LinkError::RoleViolation`] for a Publisher, before any transport call
    /// - [`LinkError::NotInitialized`] unless the connection is open
    /// - [`LinkError::Transport`] for any other transport failure
    pub fn receive(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        let role = self.role;
        permit(role, Operation::Receive)?;
        let socket = open_socket_mut(&mut self.state, Operation::Receive, role)?;
        let transport = self.shared.transport();

        if !poll_ready(transport, socket, Interest::Readable, timeout_ms, role)? {
            return Ok(0);
        }

        let received = transport
            .recv(socket, buf)
            .map_err(|e| LinkError::transport(Operation::Receive, role, e))?;
        if received > buf.len() {
            trace!(
                "[{}] Received {} bytes, truncated to {}",
                role,
                received,
                buf.len()
            );
        } else {
            trace!("[{}] Received {} bytes", role, received);
        }
        Ok(received)
    }
}

/// Reject operations the role does not allow. Runs before any transport call.
fn permit(role: ConnectionRole, op: Operation) -> Result<()> {
    let permitted = match op {
        Operation::Send => role.can_send(),
        Operation::Receive => role.can_receive(),
        Operation::InitConn | Operation::KillConn => true,
    };
    if permitted {
        Ok(())
    } else {
        Err(LinkError::RoleViolation { op, role })
    }
}

fn open_socket_mut<S>(state: &mut State<S>, op: Operation, role: ConnectionRole) -> Result<&mut S> {
    match state {
        State::Open(socket) => Ok(socket),
        _ => Err(LinkError::NotInitialized { op, role }),
    }
}

/// Poll for readiness, folding timeouts and interruptions into `false`.
fn poll_ready<T: Transport>(
    transport: &T,
    socket: &mut T::Socket,
    interest: Interest,
    timeout_ms: i32,
    role: ConnectionRole,
) -> Result<bool> {
    let op = match interest {
        Interest::Readable => Operation::Receive,
        Interest::Writable => Operation::Send,
    };

    match transport.poll(socket, interest, PollTimeout::from_millis(timeout_ms)) {
        Ok(ready) => Ok(ready),
        Err(e) if e.is_interrupted() => {
            trace!("[{}] {} poll interrupted", role, op);
            Ok(false)
        }
        Err(e) => Err(LinkError::transport(op, role, e)),
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if let State::Open(socket) = std::mem::replace(&mut self.state, State::Closed) {
            // A socket might not close correctly on a fatal error condition.
            // Don't panic, but let the user know.
            warn!(
                "[{}] Connection on {} dropped while open; call kill_conn() first",
                self.role, self.connection_string
            );
            self.shared.transport().close(socket);
            self.shared.release();
        }
    }
}

impl<T: Transport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connection_string", &self.connection_string)
            .field("role", &self.role)
            .field("state", &self.state())
            .field("transport", &self.shared.transport().name())
            .finish()
    }
}
