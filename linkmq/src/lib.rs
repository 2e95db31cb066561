//! # linkmq
//!
//! Minimal request-reply and publish-subscribe connections over a shared,
//! reference-counted messaging context.
//!
//! ## Architecture
//!
//! - **`linkmq-core`**: connection state machine, shared context, roles,
//!   polling send/receive, the `Transport` interface and the in-process
//!   backend
//! - **Backend crates**: `Transport` implementations over a native library
//! - **`linkmq`**: Public API surface (this crate)
//!
//! ## Roles
//!
//! | role       | pattern | attach  | send | receive |
//! |------------|---------|---------|------|---------|
//! | Server     | REP     | bind    | yes  | yes     |
//! | Client     | REQ     | connect | yes  | yes     |
//! | Publisher  | PUB     | bind    | yes  | no      |
//! | Subscriber | SUB     | connect | no   | yes     |
//!
//! ## Backends (opt-in via features)
//!
//! - [`inproc`] - always available, threads of one process
//! - **`zmq`** - libzmq over `tcp://`, `ipc://` and `inproc://`
//!
//! ```toml
//! [dependencies]
//! linkmq = { version = "0.1", features = ["zmq"] }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use linkmq::inproc;
//!
//! # fn example() -> linkmq::Result<()> {
//! let mut publisher = inproc::publisher("inproc://quick-start");
//! publisher.init_conn()?;
//! let mut subscriber = inproc::subscriber("inproc://quick-start");
//! subscriber.init_conn()?;
//!
//! publisher.send(b"weather: sunny", -1)?;
//!
//! let mut buf = [0u8; 64];
//! let n = subscriber.receive(&mut buf, 1000)?;
//! assert_eq!(&buf[..n], b"weather: sunny");
//!
//! subscriber.kill_conn()?;
//! publisher.kill_conn()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Timeouts
//!
//! `send` and `receive` take a signed millisecond timeout: `-1` blocks, `0`
//! returns at once, `N` waits up to `N` ms. A return of `0` means nothing
//! was transferred and the call may be retried.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;
pub mod inproc;

// Backend modules (opt-in via features)
#[cfg(feature = "zmq")]
pub mod zmq;

// Re-export core types
pub use linkmq_core::connection::{Connection, ConnectionState};
pub use linkmq_core::context::SharedContext;
pub use linkmq_core::error::{errno, LinkError, Operation, Result, TransportError};
pub use linkmq_core::options::{ConnectionOptions, DEFAULT_HWM, DEFAULT_LINGER};
pub use linkmq_core::role::ConnectionRole;
pub use linkmq_core::socket_type::SocketType;
pub use linkmq_core::timeout::PollTimeout;
pub use linkmq_core::transport::{Interest, Transport};

/// Convenient imports.
///
/// # Example
///
/// ```rust
/// use linkmq::prelude::*;
///
/// let opts = ConnectionOptions::new().with_recv_hwm(100);
/// let conn = inproc::connection("inproc://prelude", ConnectionRole::Subscriber, opts);
/// assert_eq!(conn.state(), ConnectionState::Uninitialized);
/// ```
pub mod prelude {
    pub use crate::inproc;
    #[cfg(feature = "zmq")]
    pub use crate::zmq;
    pub use crate::{
        Connection, ConnectionOptions, ConnectionRole, ConnectionState, LinkError, Result,
    };
}
