//! Silence-framed request/response exchange.
//!
//! The wire protocols this crate serves carry no length field. A response
//! is over when the line goes quiet: the first read waits out network
//! latency plus a worst-case full frame, and once bytes start arriving only
//! a short end-of-frame gap is tolerated before the frame is declared
//! complete. The strategy comes from timing-based serial master/slave
//! protocols, transplanted to stream sockets where silence substitutes for
//! the inter-character gap.
//!
//! No protocol knowledge lives here. [`Exchange::transact`] takes a
//! finished request frame and hands back whatever bytes arrived before the
//! silence; validating them (length, checksum) is the protocol layer's job.

pub mod error;
pub mod exchange;
pub mod timings;

pub use error::{ExchangeError, Result};
pub use exchange::Exchange;
pub use timings::{Timings, DEFAULT_MAX_FRAME_LEN};
