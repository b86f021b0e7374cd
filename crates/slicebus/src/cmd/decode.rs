use slicebus_frame::{decode_frame, FrameConfig};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex(&args.hex.join(" "))?;
    let config = FrameConfig {
        num_cports: args.cports,
        max_frame_size: args.max_frame,
    };

    let frame = decode_frame(&raw, &config).map_err(|err| frame_error("decode failed", err))?;
    print_frame(&frame, format);
    Ok(SUCCESS)
}
