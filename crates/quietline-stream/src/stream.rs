use std::io;
use std::time::Duration;

/// Outcome of a bounded read.
///
/// Window expiry is a first-class variant, not an error. For a
/// silence-framed transport it is the signal that the peer has finished
/// sending, so callers must be able to match on it without inspecting
/// platform error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes arrived. A count of zero is a valid (if unusual) success and
    /// does not mean end-of-stream.
    Data(usize),
    /// The window elapsed before any byte arrived.
    TimedOut,
}

/// One read or write bounded by an explicit per-call window.
///
/// Implementations arm whatever deadline mechanism the underlying stream
/// offers immediately before the operation. Hard failures (reset, closed
/// stream, rejected deadline) are `Err`; read-side expiry is
/// `Ok(ReadOutcome::TimedOut)`.
///
/// A zero window collapses to "effectively immediate" and must not be
/// reported as an error distinct from expiry.
pub trait TimedStream {
    /// Read once, waiting at most `window` for data to arrive.
    fn read_within(&mut self, buf: &mut [u8], window: Duration) -> io::Result<ReadOutcome>;

    /// Write once (possibly short), waiting at most `window`.
    ///
    /// Write-side expiry propagates as the timeout-kinded `io::Error` the
    /// platform reports; the caller armed the window and decides what it
    /// means.
    fn write_within(&mut self, buf: &[u8], window: Duration) -> io::Result<usize>;
}

impl<T: TimedStream + ?Sized> TimedStream for &mut T {
    fn read_within(&mut self, buf: &mut [u8], window: Duration) -> io::Result<ReadOutcome> {
        (**self).read_within(buf, window)
    }

    fn write_within(&mut self, buf: &[u8], window: Duration) -> io::Result<usize> {
        (**self).write_within(buf, window)
    }
}
