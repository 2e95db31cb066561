//! Socket pattern enumeration.
//!
//! A [`SocketType`] is what a connection asks its transport for when it opens
//! a socket. Only the four patterns behind the connection roles exist here.

use std::fmt;

/// Messaging patterns a transport must be able to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// PUB socket, broadcasts to every connected subscriber
    Pub,

    /// SUB socket, receives from publishers it is connected to
    Sub,

    /// REQ socket, strict send/receive alternation on the client side
    Req,

    /// REP socket, strict receive/send alternation on the server side
    Rep,
}

impl SocketType {
    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
        }
    }

    /// Check if this socket type is compatible with the given peer type.
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self, peer),
            (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
        )
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
