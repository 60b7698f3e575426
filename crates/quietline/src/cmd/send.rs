use std::fs;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

use quietline_exchange::{Exchange, Timings};
use quietline_stream::{NetStream, StreamError};
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{exchange_error, stream_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_exchange, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let request = resolve_request(&args)?;
    let timings = Timings {
        latency: parse_duration(&args.latency)?,
        byte_timeout: parse_duration(&args.byte_timeout)?,
        end_timeout: parse_duration(&args.end_timeout)?,
        max_frame_len: args.max_frame_len,
    };
    let connect_timeout = parse_duration(&args.connect_timeout)?;

    let mut stream =
        open_stream(&args, connect_timeout).map_err(|err| stream_error("connect failed", err))?;
    let peer = stream.peer_label();
    debug!(peer = %peer, request_len = request.len(), "starting exchange");

    let mut exchange = Exchange::with_timings(&mut stream, timings);
    let started = Instant::now();
    match exchange.transact(&request) {
        Ok(response) => {
            print_exchange(&response, &peer, started.elapsed(), format);
            Ok(SUCCESS)
        }
        Err(err) => {
            // A truncated frame is still worth printing for diagnosis.
            if !err.received().is_empty() {
                print_exchange(err.received(), &peer, started.elapsed(), format);
            }
            Err(exchange_error("exchange failed", err))
        }
    }
}

fn open_stream(args: &SendArgs, connect_timeout: Duration) -> Result<NetStream, StreamError> {
    #[cfg(unix)]
    if args.unix {
        return NetStream::connect_unix(&args.addr);
    }

    let addr = resolve_addr(&args.addr)?;
    NetStream::connect_timeout(&addr, connect_timeout)
}

fn resolve_addr(input: &str) -> Result<SocketAddr, StreamError> {
    let mut addrs = input
        .to_socket_addrs()
        .map_err(|source| StreamError::Connect {
            addr: input.to_string(),
            source,
        })?;
    addrs.next().ok_or_else(|| StreamError::Connect {
        addr: input.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing"),
    })
}

fn resolve_request(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(hex_str) = &args.hex {
        return hex::decode(hex_str.trim())
            .map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")));
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Err(CliError::new(
        USAGE,
        "a request payload is required (--hex, --data, or --file)",
    ))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    // Zero is legal: zero-valued timings collapse windows to "immediate".
    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
