//! linkmq Error Types
//!
//! Connection-level errors name the operation and role that failed. Transport
//! failures keep the backend's errno and message.

use crate::role::ConnectionRole;
use std::fmt;
use thiserror::Error;

/// Errno values used by the transports.
///
/// These follow the host C library, which libzmq also reports through. The
/// libzmq-specific codes start at `ZMQ_HAUSNUMERO` (156384712) everywhere.
pub mod errno {
    pub use self::sys::*;

    /// Interrupted system call
    pub const EINTR: i32 = 4;
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// Operation cannot be accomplished in current state
    pub const EFSM: i32 = 156_384_763;
    /// Context was terminated
    pub const ETERM: i32 = 156_384_765;

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    mod sys {
        /// Resource temporarily unavailable
        pub const EAGAIN: i32 = 35;
        /// Protocol not supported
        pub const EPROTONOSUPPORT: i32 = 43;
        /// Operation not supported
        pub const ENOTSUP: i32 = 45;
        /// Address already in use
        pub const EADDRINUSE: i32 = 48;
        /// Connection refused
        pub const ECONNREFUSED: i32 = 61;
    }

    // MSVC errno.h
    #[cfg(windows)]
    mod sys {
        /// Resource temporarily unavailable
        pub const EAGAIN: i32 = 11;
        /// Address already in use
        pub const EADDRINUSE: i32 = 100;
        /// Connection refused
        pub const ECONNREFUSED: i32 = 107;
        /// Operation not supported
        pub const ENOTSUP: i32 = 129;
        /// Protocol not supported
        pub const EPROTONOSUPPORT: i32 = 135;
    }

    #[cfg(not(any(
        windows,
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    )))]
    mod sys {
        /// Resource temporarily unavailable
        pub const EAGAIN: i32 = 11;
        /// Protocol not supported
        pub const EPROTONOSUPPORT: i32 = 93;
        /// Operation not supported
        pub const ENOTSUP: i32 = 95;
        /// Address already in use
        pub const EADDRINUSE: i32 = 98;
        /// Connection refused
        pub const ECONNREFUSED: i32 = 111;
    }
}

/// Failure reported by a transport primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (errno {code})")]
pub struct TransportError {
    code: i32,
    message: String,
}

impl TransportError {
    /// Create a transport error from an errno and its description
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create the error a poll reports when a signal interrupted it
    pub fn interrupted() -> Self {
        Self::new(errno::EINTR, "interrupted system call")
    }

    /// Create the error for "not ready yet"
    pub fn would_block() -> Self {
        Self::new(errno::EAGAIN, "resource temporarily unavailable")
    }

    /// Raw errno
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Human-readable description
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if the call was interrupted by a signal
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.code == errno::EINTR
    }

    /// Check if the call failed only because the socket was not ready
    #[must_use]
    pub const fn is_would_block(&self) -> bool {
        self.code == errno::EAGAIN
    }
}

/// Connection operations, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `init_conn`
    InitConn,
    /// `kill_conn`
    KillConn,
    /// `send`
    Send,
    /// `receive`
    Receive,
}

impl Operation {
    /// Get the operation as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitConn => "init_conn",
            Self::KillConn => "kill_conn",
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for connection operations
#[derive(Error, Debug)]
pub enum LinkError {
    /// `init_conn` called on an open connection
    #[error("{role}::init_conn() - connection already initialized")]
    AlreadyInitialized { role: ConnectionRole },

    /// Operation needs an open connection
    #[error("{role}::{op}() - connection has not been initialized")]
    NotInitialized {
        op: Operation,
        role: ConnectionRole,
    },

    /// `init_conn` called after `kill_conn`
    #[error("{role}::init_conn() - connection was closed, construct a new one to reconnect")]
    Closed { role: ConnectionRole },

    /// Operation not permitted for the role
    #[error("{role}::{op}() - a {role} cannot {op} data")]
    RoleViolation {
        op: Operation,
        role: ConnectionRole,
    },

    /// The transport primitive failed
    #[error("{role}::{op}() - transport error: {source}")]
    Transport {
        op: Operation,
        role: ConnectionRole,
        #[source]
        source: TransportError,
    },
}

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, LinkError>;

impl LinkError {
    /// Create a transport error for an operation
    pub fn transport(op: Operation, role: ConnectionRole, source: TransportError) -> Self {
        Self::Transport { op, role, source }
    }

    /// Check if this error comes from misuse of the API rather than the transport
    #[must_use]
    pub const fn is_caller_bug(&self) -> bool {
        !matches!(self, Self::Transport { .. })
    }

    /// Errno of the underlying transport failure, if any
    #[must_use]
    pub const fn transport_code(&self) -> Option<i32> {
        match self {
            Self::Transport { source, .. } => Some(source.code()),
            _ => None,
        }
    }

    /// Role of the connection that failed
    #[must_use]
    pub const fn role(&self) -> ConnectionRole {
        match self {
            Self::AlreadyInitialized { role }
            | Self::NotInitialized { role, .. }
            | Self::Closed { role }
            | Self::RoleViolation { role, .. }
            | Self::Transport { role, .. } => *role,
        }
    }
}
