//! Deadline-bounded stream I/O.
//!
//! Provides the [`TimedStream`] abstraction: one read or write bounded by an
//! explicit per-call window, with read-side expiry surfaced as a value
//! rather than an error. [`NetStream`] is the concrete connection handle
//! over TCP and Unix domain sockets.
//!
//! This is the lowest layer of quietline. The exchange loop in
//! `quietline-exchange` is written against [`TimedStream`] so it can be
//! driven by scripted streams in tests.

pub mod error;
pub mod net;
pub mod stream;

pub use error::{Result, StreamError};
pub use net::NetStream;
pub use stream::{ReadOutcome, TimedStream};
