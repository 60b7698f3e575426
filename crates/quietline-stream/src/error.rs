#[cfg(unix)]
use std::path::PathBuf;

/// Errors that can occur establishing or driving a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified socket path.
    #[cfg(unix)]
    #[error("failed to connect to {}: {source}", .path.display())]
    ConnectPath {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;
