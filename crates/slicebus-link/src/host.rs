//! A stand-in for the base side of the link.
//!
//! [`BaseHost`] builds inbound frames the way the base writes them and
//! services the outbound FIFOs the way the base does after seeing the
//! interrupt: read the pending reasons, then pull messages until each
//! signalled queue is empty.

use bytes::Bytes;
use slicebus_frame::{encode_frame, Result, CHECKSUM_BYPASS};
use slicebus_transport::InterruptLine;
use tracing::debug;

use crate::bus::SliceBus;
use crate::queue::{OutboundMessage, QueueId};

/// One message pulled from the slice.
#[derive(Debug, PartialEq, Eq)]
pub struct Drained {
    pub queue: QueueId,
    pub message: OutboundMessage,
}

/// Simulated base.
#[derive(Debug, Clone)]
pub struct BaseHost {
    checksum: bool,
}

impl Default for BaseHost {
    fn default() -> Self {
        Self { checksum: true }
    }
}

impl BaseHost {
    /// A base that checksums every frame it sends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send frames with a zero checksum so the slice skips validation.
    pub fn without_checksum(mut self) -> Self {
        self.checksum = false;
        self
    }

    /// Build the bytes the base would write for `payload`.
    pub fn frame(&self, host_cport: u8, local_cport: u8, payload: &[u8]) -> Result<Bytes> {
        let wire = encode_frame(host_cport, local_cport, payload)?;
        if self.checksum {
            return Ok(wire);
        }
        let mut raw = wire.to_vec();
        raw[0] = CHECKSUM_BYPASS;
        Ok(Bytes::from(raw))
    }

    /// Service the slice's interrupt.
    ///
    /// Returns nothing when the line is down. Otherwise drains every queue
    /// whose reason is pending, control first, acknowledging each reason as
    /// its queue empties.
    pub fn poll<L: InterruptLine>(&self, bus: &SliceBus<L>) -> Vec<Drained> {
        let mut drained = Vec::new();
        if !bus.line_asserted() {
            return drained;
        }

        let pending = bus.pending_signals();
        for queue in QueueId::ALL {
            if pending & queue.signal() == 0 {
                continue;
            }
            // drain_ack clears the reason under the lock that finds the queue
            // empty, including one left up by an unacknowledged drain.
            while let Some(message) = bus.drain_ack(queue) {
                drained.push(Drained { queue, message });
            }
        }

        debug!(pending, drained = drained.len(), "base serviced interrupt");
        drained
    }
}
