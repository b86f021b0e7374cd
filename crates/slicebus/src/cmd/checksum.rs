use slicebus_frame::checksum;

use crate::cmd::{parse_hex, ChecksumArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_checksum, ChecksumOutput, OutputFormat};

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex.join(" "))?;
    let out = ChecksumOutput {
        kind: "checksum",
        size: bytes.len(),
        sum: checksum::sum(&bytes),
        checksum: checksum::compute(&bytes),
        valid: checksum::validate(&bytes),
    };
    print_checksum(&out, format);
    Ok(SUCCESS)
}
