use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod burst;
pub mod decode;
pub mod encode;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a device and print the messages it sends.
    Monitor(MonitorArgs),
    /// Decode a captured byte stream.
    Decode(DecodeArgs),
    /// Print the frame for a message id and payload.
    Encode(EncodeArgs),
    /// Print the sequenced burst packets for a payload.
    Burst(BurstArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Burst(args) => burst::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device of the ANT stick (e.g. /dev/ttyUSB0).
    #[arg(env = "ANTLINK_DEVICE")]
    pub device: PathBuf,
    /// Line speed.
    #[arg(long, default_value = "57600")]
    pub baud: u32,
    /// Session config file (JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Send a system reset after opening.
    #[arg(long)]
    pub reset: bool,
    /// Network key to install, as 16 hex digits.
    #[arg(long, value_name = "HEX")]
    pub network_key: Option<String>,
    /// Network number for --network-key.
    #[arg(long, default_value = "0")]
    pub network: u8,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Exit after this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded bytes (whitespace and ':' are ignored).
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Binary capture file.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message id (decimal or 0x-prefixed hex).
    #[arg(value_parser = parse_u8)]
    pub id: u8,
    /// Payload as hex.
    #[arg(default_value = "")]
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct BurstArgs {
    /// Channel number (0-31).
    #[arg(long, short = 'c', value_parser = parse_u8)]
    pub channel: u8,
    /// Burst data as hex; must be a multiple of 8 bytes.
    #[arg(long)]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `78` or `0x4E`.
pub fn parse_u8(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid byte value {input:?}: {err}"))
}

/// Decode hex, ignoring whitespace and ':' separators.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|err| CliError::usage(format!("invalid hex {input:?}: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
