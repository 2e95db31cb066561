//! [`Transport`] over libzmq.
//!
//! Readiness is checked with `zmq_poll` and transfers use `ZMQ_DONTWAIT`, so
//! a send or receive that has been polled ready never blocks.

use linkmq_core::error::TransportError;
use linkmq_core::options::ConnectionOptions;
use linkmq_core::socket_type::SocketType;
use linkmq_core::timeout::PollTimeout;
use linkmq_core::transport::{Interest, Transport};
use tracing::{debug, trace};

/// libzmq backend. Stateless; every context it creates is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZmqTransport;

impl ZmqTransport {
    /// Create the backend.
    pub const fn new() -> Self {
        Self
    }
}

/// Map a libzmq error, keeping its errno.
fn to_transport_error(e: zmq::Error) -> TransportError {
    TransportError::new(e.to_raw(), e.message())
}

const fn zmq_socket_type(socket_type: SocketType) -> zmq::SocketType {
    match socket_type {
        SocketType::Pub => zmq::PUB,
        SocketType::Sub => zmq::SUB,
        SocketType::Req => zmq::REQ,
        SocketType::Rep => zmq::REP,
    }
}

/// libzmq takes high water marks as C ints.
fn hwm(messages: usize) -> i32 {
    i32::try_from(messages).unwrap_or(i32::MAX)
}

impl Transport for ZmqTransport {
    type Context = zmq::Context;
    type Socket = zmq::Socket;

    fn name(&self) -> &'static str {
        "ZMQ"
    }

    fn create_context(&self) -> Result<zmq::Context, TransportError> {
        let (major, minor, patch) = zmq::version();
        debug!("[ZMQ] Creating context (libzmq {}.{}.{})", major, minor, patch);
        Ok(zmq::Context::new())
    }

    fn destroy_context(&self, context: zmq::Context) {
        // zmq_ctx_term runs when the last handle drops. Every socket is
        // closed by now, so it returns once their linger periods expire.
        drop(context);
        debug!("[ZMQ] Context released");
    }

    fn open(
        &self,
        context: &zmq::Context,
        socket_type: SocketType,
        options: &ConnectionOptions,
    ) -> Result<zmq::Socket, TransportError> {
        let socket = context
            .socket(zmq_socket_type(socket_type))
            .map_err(to_transport_error)?;

        socket
            .set_sndhwm(hwm(options.send_hwm))
            .map_err(to_transport_error)?;
        socket
            .set_rcvhwm(hwm(options.recv_hwm))
            .map_err(to_transport_error)?;
        socket
            .set_linger(options.linger_millis())
            .map_err(to_transport_error)?;

        trace!(
            "[ZMQ] Opened {} socket (sndhwm={}, rcvhwm={}, linger={}ms)",
            socket_type,
            options.send_hwm,
            options.recv_hwm,
            options.linger_millis()
        );
        Ok(socket)
    }

    fn bind(&self, socket: &mut zmq::Socket, endpoint: &str) -> Result<(), TransportError> {
        socket.bind(endpoint).map_err(to_transport_error)?;
        debug!("[ZMQ] Bound to {}", endpoint);
        Ok(())
    }

    fn connect(&self, socket: &mut zmq::Socket, endpoint: &str) -> Result<(), TransportError> {
        socket.connect(endpoint).map_err(to_transport_error)?;
        debug!("[ZMQ] Connecting to {}", endpoint);
        Ok(())
    }

    fn subscribe(&self, socket: &mut zmq::Socket, prefix: &[u8]) -> Result<(), TransportError> {
        socket.set_subscribe(prefix).map_err(to_transport_error)
    }

    fn poll(
        &self,
        socket: &mut zmq::Socket,
        interest: Interest,
        timeout: PollTimeout,
    ) -> Result<bool, TransportError> {
        let events = match interest {
            Interest::Readable => zmq::POLLIN,
            Interest::Writable => zmq::POLLOUT,
        };

        let poll_items = &mut [socket.as_poll_item(events)];
        zmq::poll(poll_items, timeout.as_millis()).map_err(to_transport_error)?;

        Ok(match interest {
            Interest::Readable => poll_items[0].is_readable(),
            Interest::Writable => poll_items[0].is_writable(),
        })
    }

    fn send(&self, socket: &mut zmq::Socket, buf: &[u8]) -> Result<usize, TransportError> {
        match socket.send(buf, zmq::DONTWAIT) {
            Ok(()) => Ok(buf.len()),
            // Polled writable but the pipe filled up in between
            Err(zmq::Error::EAGAIN) => Ok(0),
            Err(e) => Err(to_transport_error(e)),
        }
    }

    fn recv(&self, socket: &mut zmq::Socket, buf: &mut [u8]) -> Result<usize, TransportError> {
        // zmq_recv reports the full message size even when it truncates
        socket
            .recv_into(buf, zmq::DONTWAIT)
            .map_err(to_transport_error)
    }

    fn close(&self, socket: zmq::Socket) {
        drop(socket);
    }
}
