use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("slicebus {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: slicebus");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SLICEBUS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("header_size: {}", slicebus_frame::HEADER_SIZE);
    println!("default_cports: {}", slicebus_frame::DEFAULT_NUM_CPORTS);
    println!("default_max_frame: {}", slicebus_frame::DEFAULT_MAX_FRAME);

    Ok(SUCCESS)
}
