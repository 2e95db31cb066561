//! libzmq backend.
//!
//! Connections created here share one process-wide `zmq::Context`, which is
//! terminated when the last of them is killed and recreated on the next
//! `init_conn`. Endpoints are anything libzmq accepts: `tcp://`, `ipc://`,
//! `inproc://`.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkmq::zmq;
//!
//! # fn example() -> linkmq::Result<()> {
//! let mut server = zmq::server("tcp://*:5555");
//! server.init_conn()?;
//!
//! let mut buf = [0u8; 256];
//! loop {
//!     let n = server.receive(&mut buf, -1)?;
//!     if n > 0 {
//!         server.send(&buf[..n.min(buf.len())], -1)?;
//!     }
//! }
//! # }
//! ```

use linkmq_core::connection::Connection;
use linkmq_core::context::SharedContext;
use linkmq_core::options::ConnectionOptions;
use linkmq_core::role::ConnectionRole;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

pub use linkmq_zmq::ZmqTransport;

/// A connection over libzmq.
pub type ZmqConnection = Connection<ZmqTransport>;

static SHARED: Lazy<Arc<SharedContext<ZmqTransport>>> =
    Lazy::new(|| {
        debug!("[ZMQ] Process-wide shared context registered");
        Arc::new(SharedContext::new(ZmqTransport::new()))
    });

/// The process-wide libzmq context.
pub fn shared_context() -> Arc<SharedContext<ZmqTransport>> {
    Arc::clone(&SHARED)
}

/// Create a connection with explicit role and options.
pub fn connection(
    connection_string: impl Into<String>,
    role: ConnectionRole,
    options: ConnectionOptions,
) -> ZmqConnection {
    Connection::with_options(connection_string, role, shared_context(), options)
}

/// Create a Server (REP, binds).
pub fn server(connection_string: impl Into<String>) -> ZmqConnection {
    Connection::server(connection_string, shared_context())
}

/// Create a Client (REQ, connects).
pub fn client(connection_string: impl Into<String>) -> ZmqConnection {
    Connection::client(connection_string, shared_context())
}

/// Create a Publisher (PUB, binds).
pub fn publisher(connection_string: impl Into<String>) -> ZmqConnection {
    Connection::publisher(connection_string, shared_context())
}

/// Create a Subscriber (SUB, connects, subscribed to everything).
pub fn subscriber(connection_string: impl Into<String>) -> ZmqConnection {
    Connection::subscriber(connection_string, shared_context())
}
