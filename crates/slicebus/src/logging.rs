use std::cmp;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events follow `--log-level`. Everything else is capped at
/// warn so a trace run shows frame dumps without dependency noise.
const BUS_TARGETS: [&str; 4] = [
    "slicebus",
    "slicebus_link",
    "slicebus_frame",
    "slicebus_transport",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn targets(level: LogLevel) -> Targets {
    let level = level.as_filter();
    Targets::new()
        .with_default(cmp::min(level, LevelFilter::WARN))
        .with_targets(BUS_TARGETS.map(|target| (target, level)))
}

/// Send bus diagnostics to stderr so stdout stays machine-readable.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = targets(level);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let _ = match format {
        LogFormat::Text => builder.finish().with(filter).try_init(),
        LogFormat::Json => builder.json().finish().with(filter).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn bus_crates_follow_requested_level() {
        let filter = targets(LogLevel::Trace);
        assert!(filter.would_enable("slicebus_link::bus", &Level::TRACE));
        assert!(filter.would_enable("slicebus_frame", &Level::DEBUG));
    }

    #[test]
    fn other_targets_stay_at_warn() {
        let filter = targets(LogLevel::Trace);
        assert!(filter.would_enable("clap_builder", &Level::WARN));
        assert!(!filter.would_enable("clap_builder", &Level::INFO));
    }

    #[test]
    fn quieter_level_applies_everywhere() {
        let filter = targets(LogLevel::Error);
        assert!(!filter.would_enable("slicebus_link", &Level::WARN));
        assert!(!filter.would_enable("other", &Level::WARN));
        assert!(filter.would_enable("other", &Level::ERROR));
    }
}
