use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod send;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one request frame and print the silence-framed response.
    Send(SendArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Peer address (host:port), or a Unix socket path with --unix.
    pub addr: String,
    /// Treat ADDR as a Unix domain socket path.
    #[cfg(unix)]
    #[arg(long)]
    pub unix: bool,
    /// Request bytes as hex (e.g. 0103000a0001).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Request bytes as a raw string.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Read request bytes from a file.
    #[arg(long, conflicts_with_all = ["hex", "data"])]
    pub file: Option<PathBuf>,
    /// Propagation allowance before the first response byte (e.g. 20ms).
    #[arg(long, default_value = "20ms")]
    pub latency: String,
    /// Per-byte transmit/receive allowance (e.g. 5ms).
    #[arg(long, default_value = "5ms")]
    pub byte_timeout: String,
    /// Quiet period that ends the response frame (e.g. 50ms).
    #[arg(long, default_value = "50ms")]
    pub end_timeout: String,
    /// Upper bound on a single response frame.
    #[arg(long, default_value_t = quietline_exchange::DEFAULT_MAX_FRAME_LEN)]
    pub max_frame_len: usize,
    /// Bound on connection establishment (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}
