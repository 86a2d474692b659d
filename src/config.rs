//! Configuration shared by the server and the client.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values. Validation
//! happens here, before any socket is opened.

use crate::protocol::ConversionMode;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 9999;

/// Pending connections queued by the listening socket.
pub const DEFAULT_BACKLOG: i32 = 5;

/// Size of the request/response buffer, terminator byte included.
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Command-line arguments for the server
#[derive(Parser, Debug)]
#[command(name = "case-server")]
#[command(version)]
#[command(about = "Serve case conversion requests over TCP", long_about = None)]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IPv4 or IPv6 address to listen on
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port to listen on (0-65535)
    #[arg(short, long, value_parser = parse_port, allow_hyphen_values = true)]
    pub port: Option<u16>,

    /// Maximum number of pending connections
    #[arg(long)]
    pub backlog: Option<i32>,

    /// Request buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "case-client")]
#[command(version)]
#[command(about = "Send one case conversion request and print the reply", long_about = None)]
pub struct ClientArgs {
    /// Path to TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IPv4 or IPv6 address of the server
    #[arg(short, long)]
    pub address: Option<String>,

    /// Server port (0-65535)
    #[arg(short, long, value_parser = parse_port, allow_hyphen_values = true)]
    pub port: Option<u16>,

    /// Message to convert
    #[arg(short, long)]
    pub message: String,

    /// Conversion type (upper, lower, or none)
    #[arg(short = 'c', long = "convert", value_parser = mode_arg)]
    pub convert: Option<ConversionMode>,

    /// Request buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network-related configuration
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            backlog: default_backlog(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backlog() -> i32 {
    DEFAULT_BACKLOG
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// Validated run options. Immutable once built.
///
/// The server only uses the input side, the client only the output side
/// plus the message and conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub message: Option<String>,
    pub in_address: Option<String>,
    pub out_address: Option<String>,
    pub in_port: u16,
    pub out_port: u16,
    pub conversion: ConversionMode,
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub options: Options,
    pub backlog: i32,
    pub buffer_size: usize,
    pub log_level: String,
}

impl Config {
    /// Load the server configuration from the process arguments.
    pub fn load_server() -> Result<Self, ConfigError> {
        Self::from_server_args(ServerArgs::parse())
    }

    /// Load the client configuration from the process arguments.
    pub fn load_client() -> Result<Self, ConfigError> {
        Self::from_client_args(ClientArgs::parse())
    }

    pub fn from_server_args(cli: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = read_toml(cli.config.as_ref())?;
        let address = cli.address.or(toml_config.network.address);
        let port = cli.port.unwrap_or(toml_config.network.port);

        let config = Config {
            options: Options {
                message: None,
                in_address: address.clone(),
                out_address: address,
                in_port: port,
                out_port: port,
                conversion: ConversionMode::None,
            },
            backlog: cli.backlog.unwrap_or(toml_config.network.backlog),
            buffer_size: cli.buffer_size.unwrap_or(toml_config.network.buffer_size),
            log_level: merge_log_level(cli.log_level, "info", toml_config.logging.level),
        };

        config.check()?;
        Ok(config)
    }

    pub fn from_client_args(cli: ClientArgs) -> Result<Self, ConfigError> {
        let toml_config = read_toml(cli.config.as_ref())?;
        let address = cli.address.or(toml_config.network.address);
        let port = cli.port.unwrap_or(toml_config.network.port);

        let config = Config {
            options: Options {
                message: Some(cli.message),
                in_address: address.clone(),
                out_address: address,
                in_port: port,
                out_port: port,
                conversion: cli.convert.unwrap_or_default(),
            },
            backlog: toml_config.network.backlog,
            buffer_size: cli.buffer_size.unwrap_or(toml_config.network.buffer_size),
            log_level: merge_log_level(cli.log_level, "warn", toml_config.logging.level),
        };

        config.check()?;
        if let Some(message) = &config.options.message {
            let len = config.options.conversion.as_str().len() + 1 + message.len();
            let max = config.buffer_size - 1;
            if len > max {
                return Err(ConfigError::RequestTooLarge { len, max });
            }
        }
        Ok(config)
    }

    /// Address the server listens on.
    pub fn listen_address(&self) -> Result<&str, ConfigError> {
        self.options
            .in_address
            .as_deref()
            .ok_or(ConfigError::MissingAddress)
    }

    /// Address the client connects to.
    pub fn connect_address(&self) -> Result<&str, ConfigError> {
        self.options
            .out_address
            .as_deref()
            .ok_or(ConfigError::MissingAddress)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.options.in_address.is_none() || self.options.out_address.is_none() {
            return Err(ConfigError::MissingAddress);
        }
        if self.buffer_size < 2 {
            return Err(ConfigError::BufferTooSmall(self.buffer_size));
        }
        if self.backlog < 1 {
            return Err(ConfigError::InvalidBacklog(self.backlog));
        }
        Ok(())
    }
}

fn read_toml(path: Option<&PathBuf>) -> Result<TomlConfig, ConfigError> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::FileRead(path.clone(), e))?;
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.clone(), e))
        }
        None => Ok(TomlConfig::default()),
    }
}

/// CLI wins unless it still holds its default value.
fn merge_log_level(cli: String, cli_default: &str, file: Option<String>) -> String {
    match file {
        Some(level) if cli == cli_default => level,
        _ => cli,
    }
}

/// Port parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port must be a number")]
    NoDigits,
    #[error("port must be between 0 and 65535")]
    OutOfRange,
    #[error("port contains invalid trailing characters")]
    InvalidChars,
}

/// Parse a decimal port number.
///
/// Leading whitespace and a sign are accepted. The range check comes
/// before the trailing-character check, so `-1x` is out of range and
/// `80x` has invalid characters.
pub fn parse_port(s: &str) -> Result<u16, PortError> {
    let trimmed = s.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(PortError::NoDigits);
    }

    let magnitude = rest[..digits]
        .bytes()
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d - b'0')));

    if negative && magnitude != 0 {
        return Err(PortError::OutOfRange);
    }
    let port = u16::try_from(magnitude).map_err(|_| PortError::OutOfRange)?;

    if digits != rest.len() {
        return Err(PortError::InvalidChars);
    }

    Ok(port)
}

fn mode_arg(s: &str) -> Result<ConversionMode, crate::protocol::UnknownMode> {
    s.parse()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an address is required")]
    MissingAddress,

    #[error("buffer size must be at least 2 bytes (got {0})")]
    BufferTooSmall(usize),

    #[error("backlog must be at least 1 (got {0})")]
    InvalidBacklog(i32),

    #[error("request of {len} bytes does not fit the {max}-byte request buffer")]
    RequestTooLarge { len: usize, max: usize },

    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    TomlParse(PathBuf, #[source] toml::de::Error),
}

impl ConfigError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::MissingAddress => ErrorKind::MissingRequiredArgument,
            ConfigError::FileRead(..) => ErrorKind::Io,
            _ => ErrorKind::ValueValidation,
        }
    }

    /// Print the error with the usage line of `A` to stderr and exit non-zero.
    pub fn exit<A: CommandFactory>(&self) -> ! {
        A::command().error(self.kind(), self).exit()
    }
}
