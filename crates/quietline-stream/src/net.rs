use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, StreamError};
use crate::stream::{ReadOutcome, TimedStream};

/// Smallest timeout ever armed on a socket.
///
/// `set_read_timeout(Some(Duration::ZERO))` is rejected as `InvalidInput`
/// by std; a zero window must behave as "effectively immediate" instead of
/// surfacing that rejection.
const MIN_WINDOW: Duration = Duration::from_micros(1);

/// A connected network stream over TCP or a Unix domain socket.
///
/// This is the connection handle the exchange layer drives. quietline never
/// shuts the connection down on its own; lifetime and shutdown policy belong
/// to the caller, who can hold the handle by `&mut` borrow for the duration
/// of each exchange.
#[derive(Debug)]
pub struct NetStream {
    inner: NetStreamInner,
}

#[derive(Debug)]
enum NetStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl NetStream {
    /// Connect to a TCP peer (blocking).
    pub fn connect(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let label = addr.to_string();
        let stream = TcpStream::connect(&addr).map_err(|source| StreamError::Connect {
            addr: label.clone(),
            source,
        })?;
        debug!(addr = %label, "connected over tcp");
        Ok(Self {
            inner: NetStreamInner::Tcp(stream),
        })
    }

    /// Connect to a TCP peer with a bound on connection establishment.
    pub fn connect_timeout(addr: &SocketAddr, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout.max(MIN_WINDOW)).map_err(
            |source| StreamError::Connect {
                addr: addr.to_string(),
                source,
            },
        )?;
        debug!(%addr, "connected over tcp");
        Ok(Self {
            inner: NetStreamInner::Tcp(stream),
        })
    }

    /// Connect to a listening Unix domain socket (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| StreamError::ConnectPath {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "connected over unix socket");
        Ok(Self {
            inner: NetStreamInner::Unix(stream),
        })
    }

    /// Wrap an already-connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: NetStreamInner::Tcp(stream),
        }
    }

    /// Wrap an already-connected Unix socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: UnixStream) -> Self {
        Self {
            inner: NetStreamInner::Unix(stream),
        }
    }

    /// Clone the handle (a new file descriptor over the same connection).
    ///
    /// A cloned handle is how a caller cancels a blocked exchange:
    /// [`NetStream::shutdown`] on the clone unblocks the pending read or
    /// write with a hard error.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            NetStreamInner::Tcp(stream) => NetStreamInner::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => NetStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Shut down both directions of the connection.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both)?,
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both)?,
        }
        Ok(())
    }

    /// Peer address label for diagnostics.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "<unknown>".to_string()),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream
                .peer_addr()
                .ok()
                .and_then(|addr| addr.as_pathname().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "<unnamed unix socket>".to_string()),
        }
    }

    fn arm_read_window(&self, window: Duration) -> io::Result<()> {
        let window = window.max(MIN_WINDOW);
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_read_timeout(Some(window)),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_read_timeout(Some(window)),
        }
    }

    fn arm_write_window(&self, window: Duration) -> io::Result<()> {
        let window = window.max(MIN_WINDOW);
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_write_timeout(Some(window)),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_write_timeout(Some(window)),
        }
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.read(buf),
        }
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.write(buf),
        }
    }
}

impl TimedStream for NetStream {
    fn read_within(&mut self, buf: &mut [u8], window: Duration) -> io::Result<ReadOutcome> {
        self.arm_read_window(window)?;
        loop {
            match self.raw_read(buf) {
                // A raw zero-byte read on a socket means the peer closed.
                // Report it as a hard error so the exchange loop can never
                // mistake EOF for an empty burst.
                Ok(0) if !buf.is_empty() => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ))
                }
                Ok(n) => return Ok(ReadOutcome::Data(n)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_expiry(&err) => return Ok(ReadOutcome::TimedOut),
                Err(err) => return Err(err),
            }
        }
    }

    fn write_within(&mut self, buf: &[u8], window: Duration) -> io::Result<usize> {
        self.arm_write_window(window)?;
        loop {
            match self.raw_write(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

/// Read-deadline expiry as the platform reports it: Unix sockets yield
/// `WouldBlock`, Windows yields `TimedOut`.
fn is_expiry(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
