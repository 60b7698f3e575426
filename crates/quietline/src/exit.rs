use std::fmt;
use std::io;

use quietline_exchange::ExchangeError;
use quietline_stream::StreamError;

// Exit codes follow the sysexits-style table shared by our tooling.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Connect { source, .. } | StreamError::Io(source) => io_error(context, source),
        #[cfg(unix)]
        StreamError::ConnectPath { source, .. } => io_error(context, source),
    }
}

pub fn exchange_error(context: &str, err: ExchangeError) -> CliError {
    match err {
        ExchangeError::EmptyRequest => CliError::new(USAGE, format!("{context}: {err}")),
        ExchangeError::Send(source) => io_error(context, source),
        ExchangeError::Recv { received, source } => {
            let mut cli = io_error(context, source);
            if !received.is_empty() {
                cli.message = format!(
                    "{} (truncated frame, {} byte(s) received)",
                    cli.message,
                    received.len()
                );
            }
            cli
        }
    }
}
