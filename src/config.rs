//! Server Configuration
//!
//! Command-line options for the `tishkv` binary. Parsing is separate from
//! acting on the result so `main` decides how to print help or report an
//! error, and the parser can be tested without a process exit.

use crate::storage::DEFAULT_SWEEP_INTERVAL;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Transport the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// Errors from command-line parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("unsupported protocol: {0} (only 'tcp' is supported)")]
    UnsupportedProtocol(String),

    #[error("invalid sweep interval: {0} (expected a positive number of milliseconds)")]
    InvalidSweepInterval(String),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Start the server
    Run(Config),
    /// Print usage and exit
    Help,
    /// Print the version and exit
    Version,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Transport
    pub protocol: Protocol,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            protocol: Protocol::Tcp,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl Config {
    /// Parses command-line arguments, excluding the program name.
    ///
    /// `--help` and `--version` win as soon as they are seen.
    pub fn parse_args<I>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args.next().ok_or(ConfigError::MissingValue("--host"))?;
                }
                "--port" | "-p" => {
                    let value = args.next().ok_or(ConfigError::MissingValue("--port"))?;
                    config.port = value.parse().map_err(|_| ConfigError::InvalidPort(value))?;
                }
                "--protocol" => {
                    let value = args
                        .next()
                        .ok_or(ConfigError::MissingValue("--protocol"))?;
                    config.protocol = match value.to_ascii_lowercase().as_str() {
                        "tcp" => Protocol::Tcp,
                        _ => return Err(ConfigError::UnsupportedProtocol(value)),
                    };
                }
                "--sweep-interval-ms" => {
                    let value = args
                        .next()
                        .ok_or(ConfigError::MissingValue("--sweep-interval-ms"))?;
                    config.sweep_interval = match value.parse::<u64>() {
                        Ok(ms) if ms > 0 => Duration::from_millis(ms),
                        _ => return Err(ConfigError::InvalidSweepInterval(value)),
                    };
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        Ok(CliAction::Run(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Usage text printed for `--help`.
pub const HELP: &str = r#"
tishkv - An in-memory key-value store with TTL, sorted sets and sets

USAGE:
    tishkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>              Port to listen on (default: 6379)
        --protocol <PROTO>         Transport (default: tcp; only tcp is supported)
        --sweep-interval-ms <MS>   Expiry sweep period (default: 100)
    -v, --version                  Print version information
        --help                     Print this help message

ENVIRONMENT:
    RUST_LOG                       Log filter (default: info)

CONNECTING:
    Use redis-cli or any RESP client:
    $ redis-cli -p 6379
    127.0.0.1:6379> SET name tish
    OK
    127.0.0.1:6379> ZADD board 10 alice
    (integer) 1
"#;
