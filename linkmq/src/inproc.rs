//! In-process backend.
//!
//! Connections created here share one process-wide context, so a Server and a
//! Client built from different threads find each other by `inproc://` name.
//! No native library is needed.
//!
//! # Example
//!
//! ```rust
//! use linkmq::inproc;
//!
//! # fn example() -> linkmq::Result<()> {
//! let mut server = inproc::server("inproc://facade-echo");
//! server.init_conn()?;
//! let mut client = inproc::client("inproc://facade-echo");
//! client.init_conn()?;
//!
//! client.send(b"ping", -1)?;
//! let mut buf = [0u8; 16];
//! let n = server.receive(&mut buf, 1000)?;
//! assert_eq!(&buf[..n], b"ping");
//!
//! client.kill_conn()?;
//! server.kill_conn()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use linkmq_core::connection::Connection;
use linkmq_core::context::SharedContext;
use linkmq_core::inproc::InprocTransport;
use linkmq_core::options::ConnectionOptions;
use linkmq_core::role::ConnectionRole;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// A connection over the in-process backend.
pub type InprocConnection = Connection<InprocTransport>;

static SHARED: Lazy<Arc<SharedContext<InprocTransport>>> =
    Lazy::new(|| {
        debug!("[INPROC] Process-wide shared context registered");
        Arc::new(SharedContext::new(InprocTransport::new()))
    });

/// The process-wide in-process context.
pub fn shared_context() -> Arc<SharedContext<InprocTransport>> {
    Arc::clone(&SHARED)
}

/// Create a connection with explicit role and options.
pub fn connection(
    connection_string: impl Into<String>,
    role: ConnectionRole,
    options: ConnectionOptions,
) -> InprocConnection {
    Connection::with_options(connection_string, role, shared_context(), options)
}

/// Create a Server.
pub fn server(connection_string: impl Into<String>) -> InprocConnection {
    Connection::server(connection_string, shared_context())
}

/// Create a Client.
pub fn client(connection_string: impl Into<String>) -> InprocConnection {
    Connection::client(connection_string, shared_context())
}

/// Create a Publisher.
pub fn publisher(connection_string: impl Into<String>) -> InprocConnection {
    Connection::publisher(connection_string, shared_context())
}

/// Create a Subscriber.
pub fn subscriber(connection_string: impl Into<String>) -> InprocConnection {
    Connection::subscriber(connection_string, shared_context())
}
