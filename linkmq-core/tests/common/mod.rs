//! Instrumented transport shared by the integration tests.
//!
//! Counts every call the connection makes and lets a test script how polls,
//! attaches and transfers behave, without any real sockets.

#![allow(dead_code)]

use linkmq_core::error::{errno, TransportError};
use linkmq_core::options::ConnectionOptions;
use linkmq_core::socket_type::SocketType;
use linkmq_core::timeout::PollTimeout;
use linkmq_core::transport::{Interest, Transport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Counters {
    pub contexts_created: AtomicUsize,
    pub contexts_destroyed: AtomicUsize,
    pub sockets_opened: AtomicUsize,
    pub sockets_closed: AtomicUsize,
    pub binds: AtomicUsize,
    pub connects: AtomicUsize,
    pub subscribes: AtomicUsize,
    pub polls: AtomicUsize,
    pub sends: AtomicUsize,
    pub recvs: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Calls that touch an open socket's data path.
    pub fn data_calls(&self) -> usize {
        Self::get(&self.polls) + Self::get(&self.sends) + Self::get(&self.recvs)
    }
}

/// What `poll` reports.
#[derive(Debug, Clone, Copy)]
pub enum PollOutcome {
    Ready,
    NotReady,
    Interrupted,
    Fail(i32),
}

#[derive(Debug, Clone)]
pub struct FakeTransport {
    pub counters: Arc<Counters>,
    poll: PollOutcome,
    fail_attach: Option<i32>,
    fail_context: bool,
    context_delay: Duration,
    message: Vec<u8>,
}

#[derive(Debug)]
pub struct FakeSocket {
    pub socket_type: SocketType,
    pub subscriptions: Vec<Vec<u8>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            poll: PollOutcome::Ready,
            fail_attach: None,
            fail_context: false,
            context_delay: Duration::ZERO,
            message: b"fake message".to_vec(),
        }
    }

    pub fn with_poll(mut self, poll: PollOutcome) -> Self {
        self.poll = poll;
        self
    }

    pub fn failing_attach(mut self, code: i32) -> Self {
        self.fail_attach = Some(code);
        self
    }

    pub fn failing_context(mut self) -> Self {
        self.fail_context = true;
        self
    }

    /// Slow down context creation to widen race windows.
    pub fn with_context_delay(mut self, delay: Duration) -> Self {
        self.context_delay = delay;
        self
    }

    pub fn with_message(mut self, message: &[u8]) -> Self {
        self.message = message.to_vec();
        self
    }

    fn attach(&self) -> Result<(), TransportError> {
        match self.fail_attach {
            Some(code) => Err(TransportError::new(code, "scripted attach failure")),
            None => Ok(()),
        }
    }
}

impl Transport for FakeTransport {
    type Context = usize;
    type Socket = FakeSocket;

    fn name(&self) -> &'static str {
        "FAKE"
    }

    fn create_context(&self) -> Result<usize, TransportError> {
        if self.fail_context {
            return Err(TransportError::new(errno::EINVAL, "scripted context failure"));
        }
        if !self.context_delay.is_zero() {
            std::thread::sleep(self.context_delay);
        }
        Ok(self.counters.contexts_created.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn destroy_context(&self, _context: usize) {
        self.counters.contexts_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn open(
        &self,
        _context: &usize,
        socket_type: SocketType,
        _options: &ConnectionOptions,
    ) -> Result<FakeSocket, TransportError> {
        self.counters.sockets_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSocket {
            socket_type,
            subscriptions: Vec::new(),
        })
    }

    fn bind(&self, _socket: &mut FakeSocket, _endpoint: &str) -> Result<(), TransportError> {
        self.counters.binds.fetch_add(1, Ordering::SeqCst);
        self.attach()
    }

    fn connect(&self, _socket: &mut FakeSocket, _endpoint: &str) -> Result<(), TransportError> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        self.attach()
    }

    fn subscribe(&self, socket: &mut FakeSocket, prefix: &[u8]) -> Result<(), TransportError> {
        self.counters.subscribes.fetch_add(1, Ordering::SeqCst);
        socket.subscriptions.push(prefix.to_vec());
        Ok(())
    }

    fn poll(
        &self,
        _socket: &mut FakeSocket,
        _interest: Interest,
        _timeout: PollTimeout,
    ) -> Result<bool, TransportError> {
        self.counters.polls.fetch_add(1, Ordering::SeqCst);
        match self.poll {
            PollOutcome::Ready => Ok(true),
            PollOutcome::NotReady => Ok(false),
            PollOutcome::Interrupted => Err(TransportError::interrupted()),
            PollOutcome::Fail(code) => Err(TransportError::new(code, "scripted poll failure")),
        }
    }

    fn send(&self, _socket: &mut FakeSocket, buf: &[u8]) -> Result<usize, TransportError> {
        self.counters.sends.fetch_add(1, Ordering::SeqCst);
        Ok(buf.len())
    }

    fn recv(&self, _socket: &mut FakeSocket, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.counters.recvs.fetch_add(1, Ordering::SeqCst);
        let copied = self.message.len().min(buf.len());
        buf[..copied].copy_from_slice(&self.message[..copied]);
        Ok(self.message.len())
    }

    fn close(&self, _socket: FakeSocket) {
        self.counters.sockets_closed.fetch_add(1, Ordering::SeqCst);
    }
}
