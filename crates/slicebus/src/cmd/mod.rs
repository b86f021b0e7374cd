use clap::{Args, Subcommand};
use slicebus_frame::{DEFAULT_MAX_FRAME, DEFAULT_NUM_CPORTS};
use std::path::PathBuf;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod checksum;
pub mod decode;
pub mod encode;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute and verify the additive checksum of a byte string.
    Checksum(ChecksumArgs),
    /// Build a wire frame for a payload.
    Encode(EncodeArgs),
    /// Validate and unpack a wire frame.
    Decode(DecodeArgs),
    /// Replay inbound frames through a bus and drain it like the base would.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Checksum(args) => checksum::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Bytes in hex (e.g. `f4 07 05 aa bb` or `0xf4,0x07`).
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Local bundle cport.
    #[arg(long, short = 'c')]
    pub cport: u8,
    /// Host cport to address.
    #[arg(long, default_value = "0")]
    pub host_cport: u8,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Leave the checksum byte zero so the receiver skips validation.
    #[arg(long)]
    pub no_checksum: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes in hex.
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
    /// Number of local cports the slice exposes.
    #[arg(long, default_value_t = DEFAULT_NUM_CPORTS)]
    pub cports: usize,
    /// Largest frame to accept, header included.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Script of inbound frames, one hex frame per line.
    ///
    /// Lines starting with `control` queue the rest of the line on the
    /// control FIFO instead. Blank lines and `#` comments are skipped.
    pub script: PathBuf,
    /// Bus config as JSON (`num_cports`, `max_frame_size`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Exit with failure if any inbound frame was dropped.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex bytes. Whitespace, `:` and `,` separate tokens; `0x` prefixes
/// are allowed per token.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .map(|tok| {
            tok.strip_prefix("0x")
                .or_else(|| tok.strip_prefix("0X"))
                .unwrap_or(tok)
        })
        .collect();

    if !digits.is_ascii() || digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("not a whole number of hex bytes: {input:?}"),
        ));
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex byte in {input:?}")))
        })
        .collect()
}
