use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use slicebus_frame::{Frame, HEADER_SIZE};
use slicebus_link::{Drained, QueueId, StatsSnapshot};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct ChecksumOutput {
    pub kind: &'static str,
    pub size: usize,
    pub sum: u8,
    pub checksum: u8,
    pub valid: bool,
}

#[derive(Serialize)]
struct FrameOutput {
    kind: &'static str,
    checksum: u8,
    checksum_checked: bool,
    host_cport: u8,
    local_cport: u8,
    payload_size: usize,
    payload: String,
}

/// One line of a simulation script and what the bus did with it.
#[derive(Serialize)]
pub struct InboundRecord {
    pub line: usize,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_cport: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_cport: Option<u8>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A message the simulated base pulled from the slice.
#[derive(Serialize)]
pub struct OutboundRecord {
    pub queue: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_cport: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_cport: Option<u8>,
    pub size: usize,
    pub bytes: String,
    #[serde(skip)]
    raw: Vec<u8>,
}

impl OutboundRecord {
    pub fn from_drained(drained: &Drained) -> Self {
        let raw = drained.message.as_bytes().to_vec();
        let (host_cport, local_cport) = match drained.queue {
            QueueId::Data => data_header(&raw).unzip(),
            QueueId::Control => (None, None),
        };
        Self {
            queue: drained.queue.name(),
            host_cport,
            local_cport,
            size: raw.len(),
            bytes: hex_string(&raw),
            raw,
        }
    }
}

#[derive(Serialize)]
pub struct SimulationReport {
    pub kind: &'static str,
    pub inbound: Vec<InboundRecord>,
    pub outbound: Vec<OutboundRecord>,
    pub purged: usize,
    pub line_drives: usize,
    pub line_transitions: usize,
    pub stats: StatsSnapshot,
}

pub fn print_checksum(out: &ChecksumOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["SIZE", "SUM", "CHECKSUM", "VALID"]);
            table.add_row(vec![
                out.size.to_string(),
                format!("{:#04x}", out.sum),
                format!("{:#04x}", out.checksum),
                out.valid.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "size={} sum={:#04x} checksum={:#04x} valid={}",
            out.size, out.sum, out.checksum, out.valid
        ),
        OutputFormat::Raw => print_raw(&[out.checksum]),
    }
}

pub fn print_frame(frame: &Frame<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            kind: "frame",
            checksum: frame.checksum,
            checksum_checked: frame.checksum_checked(),
            host_cport: frame.host_cport,
            local_cport: frame.local_cport,
            payload_size: frame.payload.len(),
            payload: hex_string(frame.payload),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec![
                "CHECKSUM",
                "HOST CPORT",
                "LOCAL CPORT",
                "SIZE",
                "PAYLOAD",
            ]);
            table.add_row(vec![
                checksum_label(frame),
                frame.host_cport.to_string(),
                frame.local_cport.to_string(),
                frame.payload.len().to_string(),
                payload_preview(frame.payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "checksum={} host_cport={} local_cport={} size={} payload={}",
            checksum_label(frame),
            frame.host_cport,
            frame.local_cport,
            frame.payload.len(),
            payload_preview(frame.payload)
        ),
        OutputFormat::Raw => print_raw(frame.payload),
    }
}

pub fn print_wire(wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct WireOutput {
                kind: &'static str,
                size: usize,
                bytes: String,
            }
            print_json(&WireOutput {
                kind: "wire",
                size: wire.len(),
                bytes: hex_string(wire),
            });
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex_string(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_simulation(report: &SimulationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut inbound = new_table(vec!["LINE", "STATUS", "LOCAL", "HOST", "SIZE", "ERROR"]);
            for rec in &report.inbound {
                inbound.add_row(vec![
                    rec.line.to_string(),
                    rec.status.to_string(),
                    opt(rec.local_cport),
                    opt(rec.host_cport),
                    rec.size.to_string(),
                    rec.error.clone().unwrap_or_default(),
                ]);
            }
            println!("{inbound}");

            let mut outbound = new_table(vec!["QUEUE", "HOST", "LOCAL", "SIZE", "BYTES"]);
            for rec in &report.outbound {
                outbound.add_row(vec![
                    rec.queue.to_string(),
                    opt(rec.host_cport),
                    opt(rec.local_cport),
                    rec.size.to_string(),
                    rec.bytes.clone(),
                ]);
            }
            println!("{outbound}");

            let stats = &report.stats;
            let mut totals = new_table(vec![
                "RECEIVED",
                "DISPATCHED",
                "BAD CHECKSUM",
                "BAD CPORT",
                "MALFORMED",
                "PURGED",
                "IRQ EDGES",
            ]);
            totals.add_row(vec![
                stats.frames_received.to_string(),
                stats.frames_dispatched.to_string(),
                stats.checksum_errors.to_string(),
                stats.cport_errors.to_string(),
                stats.malformed_frames.to_string(),
                report.purged.to_string(),
                report.line_transitions.to_string(),
            ]);
            println!("{totals}");
        }
        OutputFormat::Pretty => {
            for rec in &report.inbound {
                match &rec.error {
                    Some(err) => println!("line {}: {} ({err})", rec.line, rec.status),
                    None => println!(
                        "line {}: {} local_cport={} host_cport={} size={}",
                        rec.line,
                        rec.status,
                        opt(rec.local_cport),
                        opt(rec.host_cport),
                        rec.size
                    ),
                }
            }
            for rec in &report.outbound {
                println!("{} -> base: {}", rec.queue, rec.bytes);
            }
            println!(
                "received={} dispatched={} dropped={} purged={} irq_drives={} irq_edges={}",
                report.stats.frames_received,
                report.stats.frames_dispatched,
                report.stats.checksum_errors
                    + report.stats.cport_errors
                    + report.stats.malformed_frames,
                report.purged,
                report.line_drives,
                report.line_transitions
            );
        }
        OutputFormat::Raw => {
            for rec in &report.outbound {
                print_raw(&rec.raw);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated lowercase hex.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn checksum_label(frame: &Frame<'_>) -> String {
    if frame.checksum_checked() {
        format!("{:#04x}", frame.checksum)
    } else {
        "skipped".to_string()
    }
}

fn opt(value: Option<u8>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

/// Host and local cport of an outbound data frame.
fn data_header(bytes: &[u8]) -> Option<(u8, u8)> {
    (bytes.len() >= HEADER_SIZE).then(|| (bytes[1], bytes[2]))
}
