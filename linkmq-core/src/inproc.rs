//! In-process transport for messaging between threads of the same process.
//!
//! [`InprocTransport`] implements [`Transport`] with channels only, no
//! sockets or system calls. Endpoints use the `inproc://` URI scheme and live
//! in a registry private to their [`InprocContext`], so two contexts never see
//! each other's names.
//!
//! # Patterns
//!
//! - **REP** binds; requests land in its bounded inbox. It must reply to a
//!   request before it can receive the next one.
//! - **REQ** connects to one or more REP endpoints and round-robins requests
//!   across them, skipping peers whose queue has reached its send high water
//!   mark. It must receive the reply before it can send again.
//! - **PUB** binds; `send` copies the message into the inbox of every live
//!   subscriber whose filter matches, dropping it for subscribers whose
//!   queue has reached the publisher's send or their own receive high water
//!   mark.
//! - **SUB** connects to PUB endpoints and receives what its filter lets
//!   through. With no subscription installed it receives nothing.
//!
//! Sending or receiving out of turn fails with `EFSM`, as libzmq does.
//!
//! # Usage
//!
//! ```rust
//! use linkmq_core::inproc::InprocTransport;
//! use linkmq_core::options::ConnectionOptions;
//! use linkmq_core::socket_type::SocketType;
//! use linkmq_core::timeout::PollTimeout;
//! use linkmq_core::transport::{Interest, Transport};
//!
//! # fn example() -> Result<(), linkmq_core::error::TransportError> {
//! let transport = InprocTransport::new();
//! let ctx = transport.create_context()?;
//! let opts = ConnectionOptions::default();
//!
//! let mut rep = transport.open(&ctx, SocketType::Rep, &opts)?;
//! transport.bind(&mut rep, "inproc://echo")?;
//!
//! let mut req = transport.open(&ctx, SocketType::Req, &opts)?;
//! transport.connect(&mut req, "inproc://echo")?;
//! transport.send(&mut req, b"ping")?;
//!
//! let mut buf = [0u8; 16];
//! assert!(transport.poll(&mut rep, Interest::Readable, PollTimeout::Forever)?);
//! let n = transport.recv(&mut rep, &mut buf)?;
//! assert_eq!(&buf[..n], b"ping");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::error::{errno, TransportError};
use crate::options::ConnectionOptions;
use crate::socket_type::SocketType;
use crate::subscription::SubscriptionFilter;
use crate::timeout::PollTimeout;
use crate::transport::{Interest, Transport};
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flume::{Receiver, Sender};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// URI scheme accepted by this transport
pub const SCHEME: &str = "inproc://";

/// First re-check interval while a REQ socket waits for a peer queue to drain
const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Upper bound for the doubling re-check interval
const MAX_WRITE_POLL_INTERVAL: Duration = Duration::from_millis(32);

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// One queued message
struct Envelope {
    payload: Bytes,
    /// Inbox of the requester, set on REQ → REP traffic
    reply_to: Option<Sender<Envelope>>,
}

/// Subscriber registered with a publisher
struct SubscriberLink {
    inbox: Sender<Envelope>,
    filter: Arc<Mutex<SubscriptionFilter>>,
}

type SubscriberList = Arc<Mutex<Vec<SubscriberLink>>>;

/// What a bound name resolves to
#[derive(Clone)]
enum Endpoint {
    /// Request queue of a REP socket
    Reply { owner: u64, requests: Sender<Envelope> },
    /// Subscriber list of a PUB socket
    Publish { owner: u64, subscribers: SubscriberList },
}

impl Endpoint {
    fn socket_type(&self) -> SocketType {
        match self {
            Self::Reply { .. } => SocketType::Rep,
            Self::Publish { .. } => SocketType::Pub,
        }
    }

    fn owner(&self) -> u64 {
        match self {
            Self::Reply { owner, .. } | Self::Publish { owner, .. } => *owner,
        }
    }
}

struct ContextInner {
    id: u64,
    endpoints: DashMap<String, Endpoint>,
    next_socket_id: AtomicU64,
}

/// Context handle for [`InprocTransport`]. Clones share the same registry.
#[derive(Clone)]
pub struct InprocContext {
    inner: Arc<ContextInner>,
}

impl InprocContext {
    fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                endpoints: DashMap::new(),
                next_socket_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns true if both handles refer to the same context.
    pub fn same_context(&self, other: &InprocContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of endpoint names currently bound in this context.
    pub fn bound_endpoints(&self) -> usize {
        self.inner.endpoints.len()
    }

    fn terminate(&self) {
        self.inner.endpoints.clear();
    }
}

impl fmt::Debug for InprocContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocContext")
            .field("id", &self.inner.id)
            .field("bound_endpoints", &self.bound_endpoints())
            .finish()
    }
}

/// Per-pattern socket state
enum PatternState {
    Req {
        peers: SmallVec<[Sender<Envelope>; 2]>,
        next: usize,
        awaiting_reply: bool,
    },
    Rep {
        reply_to: Option<Sender<Envelope>>,
    },
    Pub {
        subscribers: SubscriberList,
    },
    Sub {
        filter: Arc<Mutex<SubscriptionFilter>>,
    },
}

/// Socket handle for [`InprocTransport`].
pub struct InprocSocket {
    id: u64,
    socket_type: SocketType,
    context: InprocContext,
    inbox_tx: Sender<Envelope>,
    inbox_rx: Receiver<Envelope>,
    /// Peer inbox depth at which this socket stops sending to that peer
    send_hwm: usize,
    /// Message taken off the inbox by a poll and not yet received
    lookahead: Option<Envelope>,
    bound: Vec<String>,
    state: PatternState,
}

impl InprocSocket {
    /// Pattern of this socket.
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Whether the pattern's turn-taking currently allows a receive.
    fn recv_turn(&self) -> bool {
        match &self.state {
            PatternState::Req { awaiting_reply, .. } => *awaiting_reply,
            PatternState::Rep { reply_to } => reply_to.is_none(),
            PatternState::Sub { .. } => true,
            PatternState::Pub { .. } => false,
        }
    }

    fn has_writable_peer(&self) -> bool {
        match &self.state {
            PatternState::Req { peers, .. } => peers.iter().any(|p| has_room(p, self.send_hwm)),
            _ => false,
        }
    }

    fn poll_readable(&mut self, timeout: PollTimeout) -> Result<bool, TransportError> {
        if matches!(self.state, PatternState::Pub { .. }) {
            return Err(not_supported("PUB sockets cannot receive"));
        }
        if !self.recv_turn() {
            return Err(out_of_turn(self.socket_type, "receive"));
        }
        if self.lookahead.is_some() {
            return Ok(true);
        }

        // We hold a sender for our own inbox, so it never disconnects
        let received = match timeout {
            PollTimeout::Immediate => self.inbox_rx.try_recv().ok(),
            PollTimeout::Bounded(d) => self.inbox_rx.recv_timeout(d).ok(),
            PollTimeout::Forever => self.inbox_rx.recv().ok(),
        };

        match received {
            Some(envelope) => {
                self.lookahead = Some(envelope);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn poll_writable(&mut self, timeout: PollTimeout) -> Result<bool, TransportError> {
        match &self.state {
            PatternState::Pub { .. } => return Ok(true),
            PatternState::Sub { .. } => return Err(not_supported("SUB sockets cannot send")),
            PatternState::Rep { reply_to } => {
                return if reply_to.is_some() {
                    Ok(true)
                } else {
                    Err(out_of_turn(self.socket_type, "send"))
                };
            }
            PatternState::Req { awaiting_reply, .. } => {
                if *awaiting_reply {
                    return Err(out_of_turn(self.socket_type, "send"));
                }
            }
        }

        // REQ: wait for a peer with room in its queue. Channels have no
        // "space available" signal, so re-check with a doubling sleep.
        let deadline = timeout.deadline();
        let mut interval = WRITE_POLL_INTERVAL;
        loop {
            if self.has_writable_peer() {
                return Ok(true);
            }
            let pause = match deadline {
                None => interval,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(false);
                    }
                    remaining.min(interval)
                }
            };
            std::thread::sleep(pause);
            interval = next_interval(interval);
        }
    }

    fn recv_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if matches!(self.state, PatternState::Pub { .. }) {
            return Err(not_supported("PUB sockets cannot receive"));
        }
        if !self.recv_turn() {
            return Err(out_of_turn(self.socket_type, "receive"));
        }

        let envelope = match self.lookahead.take() {
            Some(envelope) => envelope,
            None => self
                .inbox_rx
                .try_recv()
                .map_err(|_| TransportError::would_block())?,
        };

        let len = envelope.payload.len();
        let copied = len.min(buf.len());
        buf[..copied].copy_from_slice(&envelope.payload[..copied]);

        match &mut self.state {
            PatternState::Req { awaiting_reply, .. } => *awaiting_reply = false,
            PatternState::Rep { reply_to } => *reply_to = envelope.reply_to,
            _ => {}
        }

        trace!(
            "[INPROC] {} received {} bytes ({} copied)",
            self.socket_type,
            len,
            copied
        );
        Ok(len)
    }

    fn send_from(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let payload = Bytes::copy_from_slice(buf);
        let send_hwm = self.send_hwm;

        match &mut self.state {
            PatternState::Sub { .. } => Err(not_supported("SUB sockets cannot send")),

            PatternState::Pub { subscribers } => {
                let mut subscribers = subscribers.lock();
                subscribers.retain(|link| !link.inbox.is_disconnected());
                for link in subscribers.iter() {
                    if !link.filter.lock().matches(buf) {
                        continue;
                    }
                    // Effective queue limit is min(send_hwm, subscriber recv_hwm)
                    if link.inbox.len() >= send_hwm {
                        trace!("[INPROC] PUB dropped message at send high water mark");
                        continue;
                    }
                    let envelope = Envelope {
                        payload: payload.clone(),
                        reply_to: None,
                    };
                    if link.inbox.try_send(envelope).is_err() {
                        trace!("[INPROC] PUB dropped message for subscriber at high water mark");
                    }
                }
                Ok(buf.len())
            }

            PatternState::Rep { reply_to } => {
                let requester = reply_to
                    .take()
                    .ok_or_else(|| out_of_turn(SocketType::Rep, "send"))?;
                let envelope = Envelope {
                    payload,
                    reply_to: None,
                };
                if requester.try_send(envelope).is_err() {
                    trace!("[INPROC] REP reply dropped, requester is gone");
                }
                Ok(buf.len())
            }

            PatternState::Req {
                peers,
                next,
                awaiting_reply,
            } => {
                if *awaiting_reply {
                    return Err(out_of_turn(SocketType::Req, "send"));
                }
                peers.retain(|p| !p.is_disconnected());
                if peers.is_empty() {
                    return Err(TransportError::would_block());
                }

                let count = peers.len();
                let start = *next % count;
                let target = (0..count)
                    .map(|offset| (start + offset) % count)
                    .find(|&i| has_room(&peers[i], send_hwm))
                    .ok_or_else(TransportError::would_block)?;

                let envelope = Envelope {
                    payload,
                    reply_to: Some(self.inbox_tx.clone()),
                };
                peers[target]
                    .try_send(envelope)
                    .map_err(|_| TransportError::would_block())?;

                *next = target + 1;
                *awaiting_reply = true;
                Ok(buf.len())
            }
        }
    }
}

impl Drop for InprocSocket {
    fn drop(&mut self) {
        let id = self.id;
        for name in self.bound.drain(..) {
            self.context
                .inner
                .endpoints
                .remove_if(&name, |_, endpoint| endpoint.owner() == id);
            trace!("[INPROC] Unbound {}{}", SCHEME, name);
        }
    }
}

impl fmt::Debug for InprocSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocSocket")
            .field("id", &self.id)
            .field("socket_type", &self.socket_type)
            .field("bound", &self.bound)
            .field("queued", &self.inbox_rx.len())
            .finish()
    }
}

/// Transport over in-process channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct InprocTransport;

impl InprocTransport {
    /// Create the transport. It carries no state of its own.
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for InprocTransport {
    type Context = InprocContext;
    type Socket = InprocSocket;

    fn name(&self) -> &'static str {
        "INPROC"
    }

    fn create_context(&self) -> Result<InprocContext, TransportError> {
        let context = InprocContext::new();
        debug!("[INPROC] Created context {}", context.inner.id);
        Ok(context)
    }

    fn destroy_context(&self, context: InprocContext) {
        debug!(
            "[INPROC] Terminating context {} ({} endpoints still bound)",
            context.inner.id,
            context.bound_endpoints()
        );
        context.terminate();
    }

    fn open(
        &self,
        context: &InprocContext,
        socket_type: SocketType,
        options: &ConnectionOptions,
    ) -> Result<InprocSocket, TransportError> {
        let (inbox_tx, inbox_rx) = flume::bounded(options.recv_hwm.max(1));
        let state = match socket_type {
            SocketType::Req => PatternState::Req {
                peers: SmallVec::new(),
                next: 0,
                awaiting_reply: false,
            },
            SocketType::Rep => PatternState::Rep { reply_to: None },
            SocketType::Pub => PatternState::Pub {
                subscribers: Arc::new(Mutex::new(Vec::new())),
            },
            SocketType::Sub => PatternState::Sub {
                filter: Arc::new(Mutex::new(SubscriptionFilter::new())),
            },
        };

        Ok(InprocSocket {
            id: context.inner.next_socket_id.fetch_add(1, Ordering::Relaxed),
            socket_type,
            context: context.clone(),
            inbox_tx,
            inbox_rx,
            send_hwm: options.send_hwm.max(1),
            lookahead: None,
            bound: Vec::new(),
            state,
        })
    }

    fn bind(&self, socket: &mut InprocSocket, endpoint: &str) -> Result<(), TransportError> {
        let name = endpoint_name(endpoint)?;
        let entry = match &socket.state {
            PatternState::Rep { .. } => Endpoint::Reply {
                owner: socket.id,
                requests: socket.inbox_tx.clone(),
            },
            PatternState::Pub { subscribers } => Endpoint::Publish {
                owner: socket.id,
                subscribers: Arc::clone(subscribers),
            },
            _ => {
                return Err(not_supported(format!(
                    "{} sockets connect, they cannot bind",
                    socket.socket_type
                )))
            }
        };

        match socket.context.inner.endpoints.entry(name.to_string()) {
            Entry::Occupied(_) => Err(TransportError::new(
                errno::EADDRINUSE,
                format!("inproc endpoint '{}' is already bound", name),
            )),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                socket.bound.push(name.to_string());
                debug!("[INPROC] {} bound to {}", socket.socket_type, endpoint);
                Ok(())
            }
        }
    }

    fn connect(&self, socket: &mut InprocSocket, endpoint: &str) -> Result<(), TransportError> {
        let name = endpoint_name(endpoint)?;
        let target = socket
            .context
            .inner
            .endpoints
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                TransportError::new(
                    errno::ECONNREFUSED,
                    format!("inproc endpoint '{}' is not bound", name),
                )
            })?;

        if !socket.socket_type.is_compatible(target.socket_type()) {
            return Err(TransportError::new(
                errno::EPROTONOSUPPORT,
                format!(
                    "{} socket cannot connect to {} endpoint '{}'",
                    socket.socket_type,
                    target.socket_type(),
                    name
                ),
            ));
        }

        match (&mut socket.state, target) {
            (PatternState::Req { peers, .. }, Endpoint::Reply { requests, .. }) => {
                peers.push(requests);
            }
            (PatternState::Sub { filter }, Endpoint::Publish { subscribers, .. }) => {
                subscribers.lock().push(SubscriberLink {
                    inbox: socket.inbox_tx.clone(),
                    filter: Arc::clone(filter),
                });
            }
            _ => {
                return Err(not_supported(format!(
                    "{} sockets bind, they cannot connect",
                    socket.socket_type
                )))
            }
        }

        debug!("[INPROC] {} connected to {}", socket.socket_type, endpoint);
        Ok(())
    }

    fn subscribe(&self, socket: &mut InprocSocket, prefix: &[u8]) -> Result<(), TransportError> {
        match &socket.state {
            PatternState::Sub { filter } => {
                filter.lock().subscribe(prefix);
                Ok(())
            }
            _ => Err(TransportError::new(
                errno::EINVAL,
                format!("{} sockets have no subscriptions", socket.socket_type),
            )),
        }
    }

    fn poll(
        &self,
        socket: &mut InprocSocket,
        interest: Interest,
        timeout: PollTimeout,
    ) -> Result<bool, TransportError> {
        match interest {
            Interest::Readable => socket.poll_readable(timeout),
            Interest::Writable => socket.poll_writable(timeout),
        }
    }

    fn send(&self, socket: &mut InprocSocket, buf: &[u8]) -> Result<usize, TransportError> {
        socket.send_from(buf)
    }

    fn recv(&self, socket: &mut InprocSocket, buf: &mut [u8]) -> Result<usize, TransportError> {
        socket.recv_into(buf)
    }

    fn close(&self, socket: InprocSocket) {
        trace!("[INPROC] Closing {} socket {}", socket.socket_type, socket.id);
        drop(socket);
    }
}

/// Validate an endpoint and extract its name.
fn endpoint_name(endpoint: &str) -> Result<&str, TransportError> {
    let name = endpoint.strip_prefix(SCHEME).ok_or_else(|| {
        TransportError::new(
            errno::EPROTONOSUPPORT,
            format!("unsupported endpoint '{}' (expected {}name)", endpoint, SCHEME),
        )
    })?;

    if name.is_empty() {
        return Err(TransportError::new(
            errno::EINVAL,
            "inproc endpoint name cannot be empty",
        ));
    }

    Ok(name)
}

/// Whether a peer inbox can take another message from a sender whose high
/// water mark is `send_hwm`.
fn has_room(peer: &Sender<Envelope>, send_hwm: usize) -> bool {
    !peer.is_disconnected() && !peer.is_full() && peer.len() < send_hwm
}

fn next_interval(interval: Duration) -> Duration {
    (interval * 2).min(MAX_WRITE_POLL_INTERVAL)
}

fn not_supported(message: impl Into<String>) -> TransportError {
    TransportError::new(errno::ENOTSUP, message)
}

fn out_of_turn(socket_type: SocketType, op: &str) -> TransportError {
    TransportError::new(
        errno::EFSM,
        format!("{} socket cannot {} in its current state", socket_type, op),
    )
}
