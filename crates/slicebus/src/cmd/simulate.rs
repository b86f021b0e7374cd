use std::fs;
use std::sync::Arc;

use slicebus_link::{BaseHost, BusConfig, SliceBus};
use slicebus_transport::{MemoryLine, Transport};
use tracing::{debug, warn};

use crate::cmd::{parse_hex, SimulateArgs};
use crate::exit::{bus_error, io_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{
    print_simulation, InboundRecord, OutboundRecord, OutputFormat, SimulationReport,
};

/// One parsed script line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Inbound(Vec<u8>),
    Control(Vec<u8>),
}

/// Transport stand-in; the script plays the part of the I2C peripheral.
struct ScriptTransport;

impl Transport for ScriptTransport {
    fn init(&mut self) -> slicebus_transport::Result<()> {
        debug!("script transport ready");
        Ok(())
    }
}

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            BusConfig::from_json(&text).map_err(|err| bus_error("invalid config", err))?
        }
        None => BusConfig::default(),
    };
    let text = fs::read_to_string(&args.script).map_err(|err| {
        io_error(&format!("failed reading {}", args.script.display()), err)
    })?;
    let steps = parse_script(&text)?;

    let line = Arc::new(MemoryLine::new());
    let bus = SliceBus::with_config(Arc::clone(&line), config);
    bus.init(&mut ScriptTransport)
        .map_err(|err| bus_error("init failed", err))?;

    let echo = |cport: u8, payload: &[u8]| {
        if let Err(err) = bus.send_data(cport, payload) {
            warn!(error = %err, cport, "echo reply not queued");
        }
    };

    let mut inbound = Vec::with_capacity(steps.len());
    for (line, step) in steps {
        let record = match step {
            Step::Inbound(raw) => match bus.receive(&raw, &echo) {
                Ok(frame) => InboundRecord {
                    line,
                    status: "dispatched",
                    local_cport: Some(frame.local_cport),
                    host_cport: Some(frame.host_cport),
                    size: raw.len(),
                    error: None,
                },
                Err(err) => InboundRecord {
                    line,
                    status: "dropped",
                    local_cport: None,
                    host_cport: None,
                    size: raw.len(),
                    error: Some(err.to_string()),
                },
            },
            Step::Control(message) => {
                let error = bus.send_control(&message).err().map(|err| err.to_string());
                InboundRecord {
                    line,
                    status: if error.is_none() { "control" } else { "rejected" },
                    local_cport: None,
                    host_cport: None,
                    size: message.len(),
                    error,
                }
            }
        };
        inbound.push(record);
    }

    let outbound: Vec<OutboundRecord> = BaseHost::new()
        .poll(&bus)
        .iter()
        .map(OutboundRecord::from_drained)
        .collect();
    let purged = bus.cleanup();
    let stats = bus.stats();

    let dropped = inbound.iter().any(|rec| rec.error.is_some());
    print_simulation(
        &SimulationReport {
            kind: "simulation",
            inbound,
            outbound,
            purged,
            line_drives: line.drives(),
            line_transitions: line.transitions(),
            stats,
        },
        format,
    );

    if args.strict && dropped {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

/// Parse the script into `(line number, step)` pairs.
fn parse_script(text: &str) -> CliResult<Vec<(usize, Step)>> {
    let mut steps = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let step = match line.strip_prefix("control") {
            Some(rest) => Step::Control(parse_hex(rest)?),
            None => Step::Inbound(parse_hex(line)?),
        };
        if matches!(&step, Step::Control(bytes) if bytes.is_empty()) {
            return Err(CliError::new(
                USAGE,
                format!("line {line_no}: control message is empty"),
            ));
        }
        steps.push((line_no, step));
    }
    Ok(steps)
}
