use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;

use crate::error::{BusError, Result};
use crate::signal::{SIGNAL_CONTROL, SIGNAL_DATA};

/// The two outbound FIFOs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Framed greybus traffic produced by `send_data`.
    Data,
    /// Pre-framed supervisory traffic produced by `send_control`.
    Control,
}

impl QueueId {
    /// Both queues, in the order the base services them.
    pub const ALL: [QueueId; 2] = [QueueId::Control, QueueId::Data];

    /// Interrupt reason raised while this queue holds messages.
    pub fn signal(self) -> u8 {
        match self {
            QueueId::Data => SIGNAL_DATA,
            QueueId::Control => SIGNAL_CONTROL,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            QueueId::Data => "DATA",
            QueueId::Control => "CONTROL",
        }
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message waiting to be read by the base.
///
/// Not `Clone`: a message moves into its queue once and moves out once,
/// either to the transport that drains it or to the purge on cleanup.
#[derive(Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    buf: Bytes,
}

impl OutboundMessage {
    /// Wrap an already owned buffer.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Copy `data` into a newly owned buffer, reporting allocation failure.
    pub fn try_copy_from_slice(data: &[u8]) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(data.len())
            .map_err(|_| BusError::OutOfMemory { size: data.len() })?;
        buf.extend_from_slice(data);
        Ok(Self::new(buf))
    }

    /// Message bytes as they go on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if the message carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the buffer out of the message.
    pub fn into_bytes(self) -> Bytes {
        self.buf
    }
}

impl AsRef<[u8]> for OutboundMessage {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

/// A queue slot could not be allocated. The message is handed back.
#[derive(Debug, thiserror::Error)]
#[error("no memory to queue {} byte message", .0.len())]
pub struct EnqueueError(pub OutboundMessage);

impl EnqueueError {
    /// Recover the message that was not queued.
    pub fn into_inner(self) -> OutboundMessage {
        self.0
    }
}

/// Data and control FIFOs.
///
/// Strict FIFO per queue, no ordering between the two, unbounded apart from
/// available memory. Not synchronized; [`SliceBus`](crate::SliceBus) keeps it
/// behind its lock.
#[derive(Debug, Default)]
pub struct OutboundQueues {
    data: VecDeque<OutboundMessage>,
    control: VecDeque<OutboundMessage>,
    slot_limit: Option<usize>,
}

impl OutboundQueues {
    /// Create two empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues that refuse a slot once a queue holds `limit` messages, as if
    /// the allocator ran dry there.
    #[cfg(test)]
    pub(crate) fn with_slot_limit(limit: usize) -> Self {
        Self {
            slot_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Append `message` at the tail of `queue`. Never blocks.
    pub fn enqueue(
        &mut self,
        queue: QueueId,
        message: OutboundMessage,
    ) -> std::result::Result<(), EnqueueError> {
        let limit = self.slot_limit;
        let fifo = self.fifo_mut(queue);
        let exhausted = limit.is_some_and(|limit| fifo.len() >= limit);
        if exhausted || fifo.try_reserve(1).is_err() {
            return Err(EnqueueError(message));
        }
        fifo.push_back(message);
        Ok(())
    }

    /// Remove and return the oldest message in `queue`.
    pub fn drain_next(&mut self, queue: QueueId) -> Option<OutboundMessage> {
        self.fifo_mut(queue).pop_front()
    }

    pub fn is_empty(&self, queue: QueueId) -> bool {
        self.fifo(queue).is_empty()
    }

    pub fn len(&self, queue: QueueId) -> usize {
        self.fifo(queue).len()
    }

    /// Drop every message in both queues. Returns how many were dropped.
    pub fn purge_all(&mut self) -> usize {
        let purged = self.data.len() + self.control.len();
        self.data.clear();
        self.control.clear();
        purged
    }

    fn fifo(&self, queue: QueueId) -> &VecDeque<OutboundMessage> {
        match queue {
            QueueId::Data => &self.data,
            QueueId::Control => &self.control,
        }
    }

    fn fifo_mut(&mut self, queue: QueueId) -> &mut VecDeque<OutboundMessage> {
        match queue {
            QueueId::Data => &mut self.data,
            QueueId::Control => &mut self.control,
        }
    }
}
