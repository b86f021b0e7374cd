use std::fs;

use slicebus_link::BaseHost;

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;

    let host = if args.no_checksum {
        BaseHost::new().without_checksum()
    } else {
        BaseHost::new()
    };
    let wire = host
        .frame(args.host_cport, args.cport, &payload)
        .map_err(|err| frame_error("encode failed", err))?;

    print_wire(&wire, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
