//! linkmq Core
//!
//! This crate contains the transport-agnostic core building blocks:
//! - Connection roles and their configuration table (`role`)
//! - Socket patterns requested from transports (`socket_type`)
//! - Connection state machine and polling send/receive (`connection`)
//! - Reference-counted shared transport context (`context`)
//! - The transport interface (`transport`)
//! - In-process transport (`inproc`)
//! - Socket options and poll timeouts (`options`, `timeout`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
pub mod connection;
pub mod context;
pub mod error;
pub mod inproc;
pub mod options;
pub mod role;
pub mod socket_type;
pub mod subscription;
pub mod timeout;
pub mod transport;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::connection::{Connection, ConnectionState};
    pub use crate::context::SharedContext;
    pub use crate::error::{LinkError, Operation, Result, TransportError};
    pub use crate::inproc::{InprocContext, InprocSocket, InprocTransport};
    pub use crate::options::ConnectionOptions;
    pub use crate::role::ConnectionRole;
    pub use crate::socket_type::SocketType;
    pub use crate::timeout::PollTimeout;
    pub use crate::transport::{Interest, Transport};
}
