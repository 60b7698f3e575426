use bytes::{Bytes, BytesMut};
use quietline_stream::{ReadOutcome, TimedStream};
use tracing::trace;

use crate::error::{ExchangeError, Result};
use crate::timings::Timings;

/// Floor for the scratch read buffer, so a tiny configured frame bound does
/// not degrade reads to byte-at-a-time syscalls.
const MIN_SCRATCH: usize = 256;

/// One request/response exchange at a time over a stream whose wire
/// protocol carries no length field.
///
/// `Exchange` owns no protocol knowledge; it moves raw frames. The request
/// is drained through possibly-short writes, then the response is
/// accumulated until the line stays quiet for [`Timings::end_timeout`].
///
/// The connection's lifetime belongs to the caller. Construct with
/// `&mut NetStream` (any `&mut T` where `T: TimedStream` qualifies) to keep
/// ownership, or reclaim an owned stream with [`Exchange::into_inner`];
/// the exchange never shuts the connection down. `&mut self` on
/// [`Exchange::transact`] serializes exchanges at compile time.
pub struct Exchange<T> {
    stream: T,
    timings: Timings,
    scratch: Vec<u8>,
}

impl<T: TimedStream> Exchange<T> {
    /// Create an exchange with default timings.
    pub fn new(stream: T) -> Self {
        Self::with_timings(stream, Timings::default())
    }

    /// Create an exchange with explicit timings.
    pub fn with_timings(stream: T, timings: Timings) -> Self {
        let scratch = vec![0u8; timings.max_frame_len.max(MIN_SCRATCH)];
        Self {
            stream,
            timings,
            scratch,
        }
    }

    /// Perform one blocking exchange: write the whole request, then read
    /// the response until the line goes quiet.
    ///
    /// Silence with no response bytes at all is a successful empty frame;
    /// the protocol layer decides whether that means a dead peer or a
    /// valid (non-)answer. A hard stream failure mid-response surfaces as
    /// [`ExchangeError::Recv`] carrying the truncated bytes.
    pub fn transact(&mut self, request: &[u8]) -> Result<Bytes> {
        if request.is_empty() {
            return Err(ExchangeError::EmptyRequest);
        }
        self.write_request(request)?;
        self.read_frame()
    }

    /// Drain the request through possibly-short writes.
    ///
    /// The window is recomputed from the bytes still unsent, so a stream
    /// that dribbles never gets less than `byte_timeout` per remaining
    /// byte. Any failure aborts the call; no partial success is reported.
    fn write_request(&mut self, request: &[u8]) -> Result<()> {
        let mut remaining = request;
        while !remaining.is_empty() {
            let window = self.timings.write_window(remaining.len());
            let written = self
                .stream
                .write_within(remaining, window)
                .map_err(ExchangeError::Send)?;
            if written == 0 {
                return Err(ExchangeError::Send(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "stream accepted no bytes",
                )));
            }
            if written < remaining.len() {
                trace!(written, left = remaining.len() - written, "short write");
            }
            remaining = &remaining[written..];
        }
        trace!(len = request.len(), "request written");
        Ok(())
    }

    /// Accumulate response bytes until the line goes quiet.
    ///
    /// The first window must cover propagation latency plus a maximal
    /// frame from the slowest tolerated peer. After the first successful
    /// read the window tightens to `end_timeout`, so the exchange returns
    /// promptly once the peer pauses instead of always waiting out the
    /// worst case.
    fn read_frame(&mut self) -> Result<Bytes> {
        let mut frame = BytesMut::new();
        let mut window = self.timings.first_window();
        loop {
            match self.stream.read_within(&mut self.scratch, window) {
                Ok(ReadOutcome::Data(n)) => {
                    // A zero-byte success is not end-of-stream; it still
                    // counts as contact and tightens the window.
                    frame.extend_from_slice(&self.scratch[..n]);
                    trace!(burst = n, total = frame.len(), "response bytes");
                    window = self.timings.end_timeout;
                }
                Ok(ReadOutcome::TimedOut) => {
                    trace!(len = frame.len(), "response complete on quiet line");
                    return Ok(frame.freeze());
                }
                Err(source) => {
                    return Err(ExchangeError::Recv {
                        received: frame.freeze(),
                        source,
                    })
                }
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    /// Consume the exchange and return the stream.
    pub fn into_inner(self) -> T {
        self.stream
    }

    /// The timing parameters this exchange runs with.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    use super::*;

    /// Scripted peer: records writes and the windows they were given, and
    /// plays back a queue of read events.
    struct ScriptedStream {
        accepts: VecDeque<usize>,
        written: Vec<u8>,
        write_windows: Vec<Duration>,
        reads: VecDeque<ReadEvent>,
        read_windows: Vec<Duration>,
    }

    enum ReadEvent {
        Burst(Vec<u8>),
        Quiet,
        Broken(io::ErrorKind),
    }

    impl ScriptedStream {
        fn new(reads: Vec<ReadEvent>) -> Self {
            Self {
                accepts: VecDeque::new(),
                written: Vec::new(),
                write_windows: Vec::new(),
                reads: reads.into(),
                read_windows: Vec::new(),
            }
        }

        /// Limit how many bytes each successive write call accepts; calls
        /// beyond the script accept everything.
        fn accepting(mut self, chunks: &[usize]) -> Self {
            self.accepts = chunks.iter().copied().collect();
            self
        }
    }

    impl TimedStream for ScriptedStream {
        fn read_within(&mut self, buf: &mut [u8], window: Duration) -> io::Result<ReadOutcome> {
            self.read_windows.push(window);
            match self.reads.pop_front() {
                Some(ReadEvent::Burst(bytes)) => {
                    assert!(bytes.len() <= buf.len(), "script burst exceeds scratch");
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(ReadOutcome::Data(bytes.len()))
                }
                Some(ReadEvent::Quiet) | None => Ok(ReadOutcome::TimedOut),
                Some(ReadEvent::Broken(kind)) => Err(io::Error::from(kind)),
            }
        }

        fn write_within(&mut self, buf: &[u8], window: Duration) -> io::Result<usize> {
            self.write_windows.push(window);
            let n = match self.accepts.pop_front() {
                Some(limit) => buf.len().min(limit),
                None => buf.len(),
            };
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
    }

    /// The worked scenario from the transport's design discussions:
    /// 10ms per byte, 50ms end-of-frame gap, 20ms latency, 8-byte frames.
    fn timings() -> Timings {
        Timings {
            latency: Duration::from_millis(20),
            byte_timeout: Duration::from_millis(10),
            end_timeout: Duration::from_millis(50),
            max_frame_len: 8,
        }
    }

    #[test]
    fn short_writes_cover_every_request_byte() {
        let stream = ScriptedStream::new(vec![]).accepting(&[3, 1, 4]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let response = exchange.transact(b"abcdefgh").unwrap();
        assert!(response.is_empty());

        let stream = exchange.into_inner();
        assert_eq!(stream.written, b"abcdefgh");
    }

    #[test]
    fn write_window_recomputed_from_remaining_length() {
        let stream = ScriptedStream::new(vec![]).accepting(&[3, 1, 4]);
        let mut exchange = Exchange::with_timings(stream, timings());

        exchange.transact(b"abcdefgh").unwrap();

        let stream = exchange.into_inner();
        assert_eq!(
            stream.write_windows,
            vec![
                Duration::from_millis(80),
                Duration::from_millis(50),
                Duration::from_millis(40),
            ]
        );
    }

    #[test]
    fn bursts_within_end_timeout_form_one_frame() {
        let stream = ScriptedStream::new(vec![
            ReadEvent::Burst(vec![1, 2, 3]),
            ReadEvent::Burst(vec![4, 5, 6, 7, 8]),
            ReadEvent::Quiet,
        ]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let response = exchange.transact(b"req").unwrap();
        assert_eq!(response.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn total_silence_is_a_successful_empty_frame() {
        let stream = ScriptedStream::new(vec![ReadEvent::Quiet]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let response = exchange.transact(b"req").unwrap();
        assert!(response.is_empty());

        let stream = exchange.into_inner();
        assert_eq!(stream.read_windows, vec![Duration::from_millis(100)]);
    }

    #[test]
    fn first_window_is_generous_then_tightens_to_end_timeout() {
        let stream = ScriptedStream::new(vec![
            ReadEvent::Burst(vec![1]),
            ReadEvent::Burst(vec![2]),
            ReadEvent::Quiet,
        ]);
        let mut exchange = Exchange::with_timings(stream, timings());

        exchange.transact(b"req").unwrap();

        let stream = exchange.into_inner();
        assert_eq!(
            stream.read_windows,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(50),
                Duration::from_millis(50),
            ]
        );
    }

    #[test]
    fn bytes_then_silence_returns_exactly_those_bytes() {
        let stream = ScriptedStream::new(vec![
            ReadEvent::Burst(vec![0xAA, 0xBB]),
            ReadEvent::Quiet,
        ]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let response = exchange.transact(b"req").unwrap();
        assert_eq!(response.as_ref(), &[0xAA, 0xBB]);
    }

    #[test]
    fn zero_byte_success_keeps_the_loop_alive_and_tightens() {
        let stream = ScriptedStream::new(vec![
            ReadEvent::Burst(vec![]),
            ReadEvent::Burst(vec![9]),
            ReadEvent::Quiet,
        ]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let response = exchange.transact(b"req").unwrap();
        assert_eq!(response.as_ref(), &[9]);

        let stream = exchange.into_inner();
        assert_eq!(
            stream.read_windows,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(50),
                Duration::from_millis(50),
            ]
        );
    }

    #[test]
    fn hard_error_carries_partial_bytes() {
        let stream = ScriptedStream::new(vec![
            ReadEvent::Burst(vec![1, 2, 3]),
            ReadEvent::Broken(io::ErrorKind::ConnectionReset),
        ]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let err = exchange.transact(b"req").unwrap_err();
        assert_eq!(err.received(), &[1, 2, 3]);
        assert!(matches!(
            err,
            ExchangeError::Recv { source, .. }
                if source.kind() == io::ErrorKind::ConnectionReset
        ));
    }

    #[test]
    fn hard_error_before_any_byte_has_empty_partial() {
        let stream = ScriptedStream::new(vec![ReadEvent::Broken(io::ErrorKind::BrokenPipe)]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let err = exchange.transact(b"req").unwrap_err();
        assert!(err.received().is_empty());
        assert!(matches!(err, ExchangeError::Recv { .. }));
    }

    #[test]
    fn write_failure_skips_the_read_phase() {
        struct DeadWriter;

        impl TimedStream for DeadWriter {
            fn read_within(&mut self, _: &mut [u8], _: Duration) -> io::Result<ReadOutcome> {
                panic!("read phase must not start after a write failure");
            }

            fn write_within(&mut self, _: &[u8], _: Duration) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
        }

        let mut exchange = Exchange::with_timings(DeadWriter, timings());
        let err = exchange.transact(b"req").unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Send(source) if source.kind() == io::ErrorKind::BrokenPipe
        ));
    }

    #[test]
    fn zero_accepting_stream_is_write_zero() {
        let stream = ScriptedStream::new(vec![]).accepting(&[0]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let err = exchange.transact(b"req").unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Send(source) if source.kind() == io::ErrorKind::WriteZero
        ));
    }

    #[test]
    fn empty_request_is_rejected_before_any_io() {
        let stream = ScriptedStream::new(vec![]);
        let mut exchange = Exchange::with_timings(stream, timings());

        let err = exchange.transact(b"").unwrap_err();
        assert!(matches!(err, ExchangeError::EmptyRequest));

        let stream = exchange.into_inner();
        assert!(stream.write_windows.is_empty());
        assert!(stream.read_windows.is_empty());
    }

    #[test]
    fn accessors_expose_stream_and_timings() {
        let stream = ScriptedStream::new(vec![]);
        let mut exchange = Exchange::with_timings(stream, timings());

        assert_eq!(exchange.timings().max_frame_len, 8);
        let _ = exchange.get_ref();
        let _ = exchange.get_mut();
        let _stream = exchange.into_inner();
    }

    mod tcp {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::thread;
        use std::time::Instant;

        use quietline_stream::NetStream;

        use super::*;

        #[test]
        fn bursty_peer_yields_one_complete_frame() {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap().to_string();

            let peer = thread::spawn(move || {
                let (mut conn, _) = listener.accept().unwrap();
                let mut request = [0u8; 8];
                conn.read_exact(&mut request).unwrap();
                assert_eq!(&request, b"\x01\x03\x00\x0A\x00\x01\xAA\xBB");

                thread::sleep(Duration::from_millis(30));
                conn.write_all(b"abc").unwrap();
                thread::sleep(Duration::from_millis(60));
                conn.write_all(b"defgh").unwrap();
                // Stay connected well past the quiet window so EOF cannot
                // be what ends the frame.
                thread::sleep(Duration::from_millis(800));
            });

            let mut stream = NetStream::connect(addr).unwrap();
            let mut exchange = Exchange::with_timings(
                &mut stream,
                Timings {
                    latency: Duration::from_millis(50),
                    byte_timeout: Duration::from_millis(10),
                    end_timeout: Duration::from_millis(200),
                    max_frame_len: 8,
                },
            );

            let started = Instant::now();
            let response = exchange.transact(b"\x01\x03\x00\x0A\x00\x01\xAA\xBB").unwrap();
            let elapsed = started.elapsed();

            assert_eq!(response.as_ref(), b"abcdefgh");
            // Both bursts arrive by ~90ms; the quiet window then runs out
            // at ~290ms.
            assert!(elapsed >= Duration::from_millis(250), "returned too early: {elapsed:?}");
            assert!(elapsed <= Duration::from_millis(700), "returned too late: {elapsed:?}");

            peer.join().unwrap();
        }

        #[test]
        fn silent_peer_yields_empty_frame_after_first_window() {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap().to_string();

            let peer = thread::spawn(move || {
                let (mut conn, _) = listener.accept().unwrap();
                let mut request = [0u8; 8];
                conn.read_exact(&mut request).unwrap();
                thread::sleep(Duration::from_millis(700));
            });

            let mut stream = NetStream::connect(addr).unwrap();
            let mut exchange = Exchange::with_timings(
                &mut stream,
                Timings {
                    latency: Duration::from_millis(20),
                    byte_timeout: Duration::from_millis(10),
                    end_timeout: Duration::from_millis(50),
                    max_frame_len: 8,
                },
            );

            let started = Instant::now();
            let response = exchange.transact(b"\x01\x02\x03\x04\x05\x06\x07\x08").unwrap();
            let elapsed = started.elapsed();

            assert!(response.is_empty());
            // The first window is latency + 8 bytes * byte_timeout = 100ms.
            assert!(elapsed >= Duration::from_millis(80), "returned too early: {elapsed:?}");
            assert!(elapsed <= Duration::from_millis(400), "returned too late: {elapsed:?}");

            peer.join().unwrap();
        }
    }
}
