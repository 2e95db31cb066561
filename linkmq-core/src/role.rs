//! Connection roles and their configuration table.
//!
//! Every role is pure configuration over a single connection state machine:
//!
//! | role       | pattern | attach  | send | receive |
//! |------------|---------|---------|------|---------|
//! | Server     | REP     | bind    | yes  | yes     |
//! | Client     | REQ     | connect | yes  | yes     |
//! | Publisher  | PUB     | bind    | yes  | no      |
//! | Subscriber | SUB     | connect | no   | yes     |
//!
//! Servers and publishers are rendezvous points, so they bind. Clients and
//! subscribers look for an existing endpoint, so they connect.

use crate::socket_type::SocketType;
use std::fmt;

/// Fixed capability set of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRole {
    /// Answers requests. Must alternate receive then send.
    Server,
    /// Issues requests. Must alternate send then receive.
    Client,
    /// Broadcasts to subscribers. Send only.
    Publisher,
    /// Listens to a publisher. Receive only.
    Subscriber,
}

/// How a socket attaches to its connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// Listen on the address
    Bind,
    /// Dial the address
    Connect,
}

/// One row of the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    /// Pattern requested from the transport
    pub socket_type: SocketType,
    /// Bind or connect
    pub attach: Attach,
    /// Whether `send` is permitted
    pub can_send: bool,
    /// Whether `receive` is permitted
    pub can_receive: bool,
    /// Install the match-all subscription after attaching
    pub subscribe_all: bool,
}

impl ConnectionRole {
    /// All roles, in table order.
    pub const ALL: [ConnectionRole; 4] = [
        ConnectionRole::Server,
        ConnectionRole::Client,
        ConnectionRole::Publisher,
        ConnectionRole::Subscriber,
    ];

    /// Look up this role's configuration.
    #[must_use]
    pub const fn profile(self) -> RoleProfile {
        match self {
            Self::Server => RoleProfile {
                socket_type: SocketType::Rep,
                attach: Attach::Bind,
                can_send: true,
                can_receive: true,
                subscribe_all: false,
            },
            Self::Client => RoleProfile {
                socket_type: SocketType::Req,
                attach: Attach::Connect,
                can_send: true,
                can_receive: true,
                subscribe_all: false,
            },
            Self::Publisher => RoleProfile {
                socket_type: SocketType::Pub,
                attach: Attach::Bind,
                can_send: true,
                can_receive: false,
                subscribe_all: false,
            },
            Self::Subscriber => RoleProfile {
                socket_type: SocketType::Sub,
                attach: Attach::Connect,
                can_send: false,
                can_receive: true,
                subscribe_all: true,
            },
        }
    }

    /// Pattern this role requests from the transport.
    #[must_use]
    pub const fn socket_type(self) -> SocketType {
        self.profile().socket_type
    }

    /// Whether this role binds (as opposed to connects).
    #[must_use]
    pub const fn binds(self) -> bool {
        matches!(self.profile().attach, Attach::Bind)
    }

    /// Whether this role may call `send`.
    #[must_use]
    pub const fn can_send(self) -> bool {
        self.profile().can_send
    }

    /// Whether this role may call `receive`.
    #[must_use]
    pub const fn can_receive(self) -> bool {
        self.profile().can_receive
    }

    /// Get the role as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Client => "Client",
            Self::Publisher => "Publisher",
            Self::Subscriber => "Subscriber",
        }
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
