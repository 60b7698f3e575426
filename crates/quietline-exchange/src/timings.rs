use std::time::Duration;

/// Largest inbound frame the default configuration budgets for.
///
/// The classic RTU ADU bound; the silence-framing strategy comes from
/// RTU-style serial lines, where no frame exceeds this.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256;

/// Timing parameters for silence-framed exchanges.
///
/// The write window scales with the bytes left to send. The first read
/// window covers propagation latency plus a worst-case full frame from the
/// slowest tolerated peer; once the peer has started answering, only
/// [`Timings::end_timeout`] of quiet is tolerated before the frame is
/// considered complete.
///
/// All durations may be zero, which collapses the corresponding window to
/// "effectively immediate". The parameters are read-only once handed to an
/// [`crate::Exchange`].
#[derive(Debug, Clone)]
pub struct Timings {
    /// Propagation allowance added to the first read window.
    pub latency: Duration,
    /// Time budget to move one byte, in either direction.
    pub byte_timeout: Duration,
    /// Quiet period that ends an inbound frame once bytes have arrived.
    pub end_timeout: Duration,
    /// Upper bound on a single inbound frame, used to size the first read
    /// window and the scratch buffer. Not enforced against the peer.
    pub max_frame_len: usize,
}

impl Default for Timings {
    /// Conservative values for a LAN-attached gateway.
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(20),
            byte_timeout: Duration::from_millis(5),
            end_timeout: Duration::from_millis(50),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl Timings {
    /// Window for the first read of a response: latency plus a maximal
    /// frame at the slowest tolerated byte rate. Saturates instead of
    /// overflowing.
    pub fn first_window(&self) -> Duration {
        self.latency
            .saturating_add(scale(self.byte_timeout, self.max_frame_len))
    }

    /// Window to transmit `len` bytes. Saturates instead of overflowing.
    pub fn write_window(&self, len: usize) -> Duration {
        scale(self.byte_timeout, len)
    }
}

fn scale(per_byte: Duration, count: usize) -> Duration {
    per_byte.saturating_mul(u32::try_from(count).unwrap_or(u32::MAX))
}
