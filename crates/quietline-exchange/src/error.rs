use bytes::Bytes;

/// Errors that can occur during a frame exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The outbound frame was empty.
    #[error("request frame is empty")]
    EmptyRequest,

    /// The request could not be fully transmitted. No response was read.
    #[error("failed to transmit request: {0}")]
    Send(#[source] std::io::Error),

    /// The stream failed while the response was being read.
    ///
    /// `received` holds the bytes accumulated before the failure; a caller
    /// seeing a non-empty `received` is looking at a truncated frame.
    #[error("stream failed after {} response byte(s): {source}", .received.len())]
    Recv {
        received: Bytes,
        #[source]
        source: std::io::Error,
    },
}

impl ExchangeError {
    /// Response bytes accumulated before the failure.
    ///
    /// Empty unless the read phase had already received data.
    pub fn received(&self) -> &[u8] {
        match self {
            ExchangeError::Recv { received, .. } => received,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
