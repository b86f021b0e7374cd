//! Message handoff between a slice module and its base.
//!
//! [`SliceBus`] owns everything the link shares between the receive context
//! and application code: the two outbound FIFOs, the cport remap table and
//! the pending interrupt reasons. Inbound frames are validated and routed
//! upward; outbound payloads are framed, queued, and announced by raising
//! the interrupt line until the transport drains them.

pub mod bus;
pub mod config;
pub mod error;
pub mod host;
pub mod queue;
pub mod router;
pub mod signal;
pub mod stats;

pub use bus::SliceBus;
pub use config::BusConfig;
pub use error::{BusError, Result};
pub use host::{BaseHost, Drained};
pub use queue::{EnqueueError, OutboundMessage, OutboundQueues, QueueId};
pub use router::Router;
pub use signal::{SignalController, SIGNAL_ALL, SIGNAL_CONTROL, SIGNAL_DATA};
pub use stats::{BusStats, StatsSnapshot};
