//! linkmq libzmq backend
//!
//! Implements the [`Transport`](linkmq_core::transport::Transport) interface
//! over the `zmq` crate, so the connection roles speak real ZeroMQ over
//! `tcp://`, `ipc://` and `inproc://` endpoints.
//!
//! This crate is internal; enable the `zmq` feature of `linkmq` and use
//! `linkmq::zmq` instead.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod transport;

pub use transport::ZmqTransport;
