//! Silence-framed frame transport for length-less wire protocols.
//!
//! quietline exchanges whole request/response frames over a persistent
//! stream when the wire protocol carries no length field: the outbound
//! frame is written through short writes, and the inbound frame ends when
//! the line stays quiet.
//!
//! # Crate Structure
//!
//! - [`stream`] - deadline-bounded stream I/O ([`stream::NetStream`],
//!   [`stream::TimedStream`])
//! - [`exchange`] - timing configuration and the exchange loop
//!   ([`exchange::Exchange`], [`exchange::Timings`])

/// Re-export stream types.
pub mod stream {
    pub use quietline_stream::*;
}

/// Re-export exchange types.
pub mod exchange {
    pub use quietline_exchange::*;
}
