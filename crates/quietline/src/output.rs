use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    peer: &'a str,
    response_len: usize,
    response_hex: String,
    elapsed_ms: u128,
}

pub fn print_exchange(response: &[u8], peer: &str, elapsed: Duration, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                peer,
                response_len: response.len(),
                response_hex: hex::encode(response),
                elapsed_ms: elapsed.as_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            let rendered = if response.is_empty() {
                "<empty>".to_string()
            } else {
                hex::encode(response)
            };
            println!(
                "peer={} len={} elapsed={}ms response={}",
                peer,
                response.len(),
                elapsed.as_millis(),
                rendered
            );
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            let _ = out.write_all(response);
            let _ = out.flush();
        }
    }
}
