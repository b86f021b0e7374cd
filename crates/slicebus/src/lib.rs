//! Message framing and transport handoff between a slice module and its base.
//!
//! A slice talks to its base over a register-mapped, interrupt-signaled
//! link. slicebus frames each message with a checksummed 3-byte header,
//! remaps cports between module and host numbering, and queues outbound
//! messages until the transport drains them.
//!
//! # Crate Structure
//!
//! - [`transport`]: Interrupt line and transport seams
//! - [`frame`]: Checksum, 3-byte-header framing, cport remap table
//! - [`link`]: Outbound FIFOs, interrupt signaling, the `SliceBus` context (behind `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use slicebus_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use slicebus_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use slicebus_link::*;
}
