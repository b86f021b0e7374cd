use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use slicebus_frame::{
    channel, decode_frame, encode_frame, CportRemap, Frame, FrameConfig, FrameError, HEADER_SIZE,
};
use slicebus_transport::{InterruptLine, Transport};
use tracing::{debug, trace, warn};

use crate::config::BusConfig;
use crate::error::{BusError, Result};
use crate::queue::{OutboundMessage, OutboundQueues, QueueId};
use crate::router::Router;
use crate::signal::{SignalController, SIGNAL_ALL, SIGNAL_CONTROL, SIGNAL_DATA};
use crate::stats::{BusStats, StatsSnapshot};

/// Shared state of one slice/base link.
///
/// All methods take `&self`. Queues, remap table and pending reasons sit
/// behind a single mutex, and every operation finishes its check-then-update
/// (line drive included) inside one acquisition. Share it between the
/// receive context and application code with an `Arc`.
pub struct SliceBus<L> {
    config: BusConfig,
    frame_config: FrameConfig,
    state: Mutex<BusState<L>>,
    stats: BusStats,
}

struct BusState<L> {
    queues: OutboundQueues,
    remap: CportRemap,
    signals: SignalController<L>,
}

impl<L: InterruptLine> SliceBus<L> {
    /// Create a bus with default sizing driving `line`.
    pub fn new(line: L) -> Self {
        Self::with_config(line, BusConfig::default())
    }

    /// Create a bus with explicit sizing.
    pub fn with_config(line: L, config: BusConfig) -> Self {
        let frame_config = config.frame_config();
        Self {
            state: Mutex::new(BusState {
                queues: OutboundQueues::new(),
                remap: CportRemap::new(frame_config.num_cports),
                signals: SignalController::new(line),
            }),
            frame_config,
            config,
            stats: BusStats::default(),
        }
    }

    /// Reset both FIFOs, then bring up the transport.
    ///
    /// A transport failure is returned as-is in `BusError::Transport`.
    pub fn init<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<()> {
        let dropped = self.lock().queues.purge_all();
        if dropped > 0 {
            debug!(dropped, "discarded stale messages on init");
        }
        transport.init()?;
        debug!(
            cports = self.frame_config.num_cports,
            max_frame = self.frame_config.max_frame_size,
            "bus initialized"
        );
        Ok(())
    }

    /// Validate an inbound frame, learn its host cport and route the payload.
    ///
    /// Called by the transport with the bytes the base wrote. Rejected frames
    /// are logged and dropped without touching bus state; the error is
    /// returned for the caller's information only. The router runs after the
    /// lock is released.
    pub fn receive<'a, R: Router + ?Sized>(
        &self,
        rx: &'a [u8],
        router: &R,
    ) -> slicebus_frame::Result<Frame<'a>> {
        self.stats.received();

        let frame = match decode_frame(rx, &self.frame_config) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.dropped(&err);
                warn!(error = %err, len = rx.len(), "dropping inbound frame");
                trace!(frame = %HexDump(rx), "dropped frame bytes");
                return Err(err);
            }
        };

        self.lock()
            .remap
            .record(frame.local_cport, frame.host_cport)?;

        trace!(
            cport = frame.local_cport,
            host_cport = frame.host_cport,
            len = frame.payload.len(),
            checked = frame.checksum_checked(),
            "dispatching inbound frame"
        );
        router.dispatch(frame.local_cport, frame.payload);
        self.stats.dispatched();

        Ok(frame)
    }

    /// Frame `payload` for `local_cport`, queue it and raise the data reason.
    ///
    /// The host cport comes from the last inbound frame on `local_cport`; if
    /// none arrived yet the frame carries host cport 0. On error nothing is
    /// queued.
    pub fn send_data(&self, local_cport: u8, payload: &[u8]) -> Result<()> {
        if !channel::is_valid(local_cport, self.frame_config.num_cports) {
            return Err(BusError::InvalidCport {
                cport: local_cport,
                max: self.frame_config.num_cports,
            });
        }
        let size = HEADER_SIZE + payload.len();
        if size > self.frame_config.max_frame_size {
            return Err(BusError::PayloadTooLarge {
                size,
                max: self.frame_config.max_frame_size,
            });
        }

        let mut state = self.lock();
        let host_cport = match state.remap.get(local_cport)? {
            Some(host_cport) => host_cport,
            None => {
                debug!(cport = local_cport, "no host cport learned yet");
                state.remap.lookup(local_cport)?
            }
        };

        let wire = encode_frame(host_cport, local_cport, payload).map_err(encode_to_bus_error)?;
        let fifo_empty = state.queues.is_empty(QueueId::Data);
        state
            .queues
            .enqueue(QueueId::Data, OutboundMessage::new(wire))
            .map_err(|err| BusError::OutOfMemory {
                size: err.into_inner().len(),
            })?;
        state.signals.assert(SIGNAL_DATA);
        drop(state);

        self.stats.data_queued();
        debug!(
            cport = local_cport,
            host_cport,
            len = payload.len(),
            size,
            fifo_empty,
            "queued data frame"
        );
        trace!(payload = %HexDump(payload), "data payload");
        Ok(())
    }

    /// Queue a copy of an already framed control message and raise the
    /// control reason. No header or checksum is added.
    pub fn send_control(&self, message: &[u8]) -> Result<()> {
        if message.len() > self.frame_config.max_frame_size {
            return Err(BusError::PayloadTooLarge {
                size: message.len(),
                max: self.frame_config.max_frame_size,
            });
        }
        let owned = OutboundMessage::try_copy_from_slice(message)?;

        let mut state = self.lock();
        let fifo_empty = state.queues.is_empty(QueueId::Control);
        state
            .queues
            .enqueue(QueueId::Control, owned)
            .map_err(|err| BusError::OutOfMemory {
                size: err.into_inner().len(),
            })?;
        state.signals.assert(SIGNAL_CONTROL);
        drop(state);

        self.stats.control_queued();
        debug!(len = message.len(), fifo_empty, "queued control message");
        Ok(())
    }

    /// Remove the oldest message from `queue`.
    ///
    /// Leaves the interrupt reason alone; the transport clears it with
    /// [`deassert`](Self::deassert) once it sees the queue empty, or uses
    /// [`drain_ack`](Self::drain_ack) to do both at once.
    pub fn drain_next(&self, queue: QueueId) -> Option<OutboundMessage> {
        self.lock().queues.drain_next(queue)
    }

    /// Remove the oldest message from `queue` and clear its reason if that
    /// left the queue empty.
    pub fn drain_ack(&self, queue: QueueId) -> Option<OutboundMessage> {
        let mut state = self.lock();
        let message = state.queues.drain_next(queue);
        if state.queues.is_empty(queue) {
            state.signals.deassert(queue.signal());
        }
        message
    }

    /// Clear interrupt reasons in `mask`.
    pub fn deassert(&self, mask: u8) {
        self.lock().signals.deassert(mask);
    }

    /// Raise interrupt reasons in `mask`.
    pub fn assert(&self, mask: u8) {
        self.lock().signals.assert(mask);
    }

    /// Drop the interrupt line, then free everything still queued.
    ///
    /// Safe to call more than once. Returns the number of messages freed.
    pub fn cleanup(&self) -> usize {
        let mut state = self.lock();
        state.signals.deassert(SIGNAL_ALL);
        let purged = state.queues.purge_all();
        drop(state);

        self.stats.purged(purged);
        debug!(purged, "bus cleaned up");
        purged
    }

    /// Pending interrupt reasons, as the base reads them.
    pub fn pending_signals(&self) -> u8 {
        self.lock().signals.pending()
    }

    /// Whether the interrupt line is currently asserted.
    pub fn line_asserted(&self) -> bool {
        self.lock().signals.line_asserted()
    }

    pub fn is_empty(&self, queue: QueueId) -> bool {
        self.lock().queues.is_empty(queue)
    }

    pub fn queued(&self, queue: QueueId) -> usize {
        self.lock().queues.len(queue)
    }

    /// Host cport learned for `local_cport`, if any frame arrived on it.
    pub fn host_cport(&self, local_cport: u8) -> Result<Option<u8>> {
        Ok(self.lock().remap.get(local_cport)?)
    }

    /// Bus sizing.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, BusState<L>> {
        // Every update leaves the state consistent before it can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L> fmt::Debug for SliceBus<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceBus")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn encode_to_bus_error(err: FrameError) -> BusError {
    match err {
        FrameError::OutOfMemory { size } => BusError::OutOfMemory { size },
        other => BusError::Frame(other),
    }
}

struct HexDump<'a>(&'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use slicebus_frame::{checksum, CHECKSUM_BYPASS, DEFAULT_NUM_CPORTS};
    use slicebus_transport::{MemoryLine, TransportError};

    use super::*;

    type TestBus = SliceBus<Arc<MemoryLine>>;

    fn bus() -> (Arc<MemoryLine>, TestBus) {
        let line = Arc::new(MemoryLine::new());
        let bus = SliceBus::new(Arc::clone(&line));
        (line, bus)
    }

    fn inbound(host_cport: u8, local_cport: u8, payload: &[u8]) -> Vec<u8> {
        encode_frame(host_cport, local_cport, payload)
            .unwrap()
            .to_vec()
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(u8, Vec<u8>)>>,
    }

    impl Router for Recorder {
        fn dispatch(&self, local_cport: u8, payload: &[u8]) {
            self.calls
                .lock()
                .unwrap()
                .push((local_cport, payload.to_vec()));
        }
    }

    impl Recorder {
        fn calls(&self) -> Vec<(u8, Vec<u8>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct CountingTransport {
        inits: usize,
        fail: bool,
    }

    impl Transport for CountingTransport {
        fn init(&mut self) -> slicebus_transport::Result<()> {
            self.inits += 1;
            if self.fail {
                return Err(TransportError::Init("i2c slave address busy".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn receive_dispatches_payload_and_learns_host_cport() {
        let (_line, bus) = bus();
        let router = Recorder::default();

        let raw = inbound(7, 5, b"ping");
        let frame = bus.receive(&raw, &router).unwrap();

        assert_eq!(frame.local_cport, 5);
        assert_eq!(router.calls(), vec![(5, b"ping".to_vec())]);
        assert_eq!(bus.host_cport(5).unwrap(), Some(7));
    }

    #[test]
    fn receive_accepts_zero_checksum_without_validating() {
        // A zero checksum disables integrity checking entirely; any peer that
        // can write the receive buffer can push unchecked frames this way.
        let (_line, bus) = bus();
        let router = Recorder::default();
        let raw = [CHECKSUM_BYPASS, 0x11, 0x02, 0xFF, 0x00, 0x42];
        assert!(!checksum::validate(&raw));

        bus.receive(&raw, &router).unwrap();

        assert_eq!(router.calls(), vec![(2, vec![0xFF, 0x00, 0x42])]);
        assert_eq!(bus.host_cport(2).unwrap(), Some(0x11));
    }

    #[test]
    fn receive_drops_bad_checksum_without_dispatch() {
        let (_line, bus) = bus();
        let router = Recorder::default();
        let mut raw = inbound(7, 5, b"corrupt me");
        raw[4] ^= 0x40;

        let err = bus.receive(&raw, &router).unwrap_err();

        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert!(router.calls().is_empty());
        assert_eq!(bus.host_cport(5).unwrap(), None);
        assert_eq!(bus.stats().checksum_errors, 1);
        assert_eq!(bus.stats().frames_dispatched, 0);
    }

    #[test]
    fn receive_drops_out_of_range_cport() {
        let (_line, bus) = bus();
        let router = Recorder::default();

        let err = bus
            .receive(&inbound(1, DEFAULT_NUM_CPORTS as u8, b"x"), &router)
            .unwrap_err();

        assert!(matches!(err, FrameError::InvalidCport { .. }));
        assert!(router.calls().is_empty());
        assert_eq!(bus.stats().cport_errors, 1);
    }

    #[test]
    fn receive_drops_truncated_buffer() {
        let (_line, bus) = bus();
        let router = Recorder::default();

        assert!(bus.receive(&[0x00, 0x01], &router).is_err());
        assert!(router.calls().is_empty());
        assert_eq!(bus.stats().malformed_frames, 1);
    }

    #[test]
    fn send_data_uses_learned_host_cport() {
        let (line, bus) = bus();
        bus.receive(&inbound(7, 5, b"req"), &Recorder::default())
            .unwrap();

        bus.send_data(5, &[0xAA, 0xBB]).unwrap();

        let queued = bus.drain_next(QueueId::Data).unwrap();
        let bytes = queued.as_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE + 2);
        assert_eq!(bytes[1], 7);
        assert_eq!(bytes[2], 5);
        assert_eq!(&bytes[HEADER_SIZE..], &[0xAA, 0xBB]);
        assert!(checksum::validate(bytes));
        assert!(line.is_asserted());
        assert_eq!(bus.pending_signals(), SIGNAL_DATA);
    }

    #[test]
    fn send_data_before_any_inbound_uses_unmapped_host_cport() {
        let (_line, bus) = bus();

        bus.send_data(3, b"early").unwrap();

        let queued = bus.drain_next(QueueId::Data).unwrap();
        assert_eq!(queued.as_bytes()[1], slicebus_frame::UNMAPPED_HOST_CPORT);
    }

    #[test]
    fn send_data_rejects_invalid_cport_without_queuing() {
        let (line, bus) = bus();

        let err = bus.send_data(200, b"x").unwrap_err();

        assert!(matches!(err, BusError::InvalidCport { cport: 200, .. }));
        assert!(bus.is_empty(QueueId::Data));
        assert!(!line.is_asserted());
    }

    #[test]
    fn send_data_rejects_oversized_payload() {
        let line = Arc::new(MemoryLine::new());
        let bus = SliceBus::with_config(
            Arc::clone(&line),
            BusConfig {
                max_frame_size: 8,
                ..BusConfig::default()
            },
        );

        let err = bus.send_data(0, &[0u8; 6]).unwrap_err();

        assert!(matches!(err, BusError::PayloadTooLarge { size: 9, max: 8 }));
        assert!(bus.is_empty(QueueId::Data));
        assert!(!line.is_asserted());
    }

    fn starved_bus(slots: usize) -> (Arc<MemoryLine>, TestBus) {
        let (line, bus) = bus();
        bus.lock().queues = OutboundQueues::with_slot_limit(slots);
        (line, bus)
    }

    #[test]
    fn send_data_out_of_memory_queues_nothing() {
        let (line, bus) = starved_bus(0);
        bus.receive(&inbound(7, 5, b"req"), &Recorder::default())
            .unwrap();

        let err = bus.send_data(5, b"reply").unwrap_err();

        assert!(matches!(
            err,
            BusError::OutOfMemory { size } if size == HEADER_SIZE + 5
        ));
        assert!(bus.is_empty(QueueId::Data));
        assert!(!line.is_asserted());
        assert_eq!(bus.pending_signals(), 0);
        assert_eq!(bus.stats().data_queued, 0);
    }

    #[test]
    fn send_control_out_of_memory_queues_nothing() {
        let (line, bus) = starved_bus(0);

        let err = bus.send_control(&[0x01, 0x02]).unwrap_err();

        assert!(matches!(err, BusError::OutOfMemory { size: 2 }));
        assert!(bus.is_empty(QueueId::Control));
        assert!(!line.is_asserted());
        assert_eq!(bus.stats().control_queued, 0);
    }

    #[test]
    fn out_of_memory_leaves_earlier_messages_signalled() {
        let (line, bus) = starved_bus(1);
        bus.send_control(b"c1").unwrap();

        assert!(bus.send_control(b"c2").is_err());

        assert_eq!(bus.queued(QueueId::Control), 1);
        assert!(line.is_asserted());
        assert_eq!(bus.pending_signals(), SIGNAL_CONTROL);
    }

    #[test]
    fn encode_allocation_failure_maps_to_out_of_memory() {
        assert!(matches!(
            encode_to_bus_error(FrameError::OutOfMemory { size: 64 }),
            BusError::OutOfMemory { size: 64 }
        ));
        assert!(matches!(
            encode_to_bus_error(FrameError::Truncated { len: 1 }),
            BusError::Frame(FrameError::Truncated { len: 1 })
        ));
    }

    #[test]
    fn send_control_queues_verbatim_copy() {
        let (line, bus) = bus();
        let mut message = vec![0x01, 0x02, 0x03];

        bus.send_control(&message).unwrap();
        message[0] = 0xFF;

        let queued = bus.drain_next(QueueId::Control).unwrap();
        assert_eq!(queued.as_bytes(), &[0x01, 0x02, 0x03]);
        assert!(line.is_asserted());
        assert_eq!(bus.pending_signals(), SIGNAL_CONTROL);
        assert!(bus.is_empty(QueueId::Data));
    }

    #[test]
    fn drain_next_preserves_order() {
        let (_line, bus) = bus();
        bus.send_control(b"m1").unwrap();
        bus.send_control(b"m2").unwrap();
        bus.send_control(b"m3").unwrap();

        let drained: Vec<_> = std::iter::from_fn(|| bus.drain_next(QueueId::Control))
            .map(|m| m.as_bytes().to_vec())
            .collect();

        assert_eq!(drained, vec![b"m1".to_vec(), b"m2".to_vec(), b"m3".to_vec()]);
    }

    #[test]
    fn drain_next_leaves_reason_for_transport_to_clear() {
        let (line, bus) = bus();
        bus.send_data(0, b"x").unwrap();

        assert!(bus.drain_next(QueueId::Data).is_some());
        assert!(line.is_asserted());

        bus.deassert(QueueId::Data.signal());
        assert!(!line.is_asserted());
    }

    #[test]
    fn drain_ack_clears_reason_when_queue_empties() {
        let (line, bus) = bus();
        bus.send_data(0, b"a").unwrap();
        bus.send_data(0, b"b").unwrap();
        bus.send_control(b"c").unwrap();

        assert!(bus.drain_ack(QueueId::Data).is_some());
        assert_eq!(bus.pending_signals(), SIGNAL_ALL);

        assert!(bus.drain_ack(QueueId::Data).is_some());
        assert_eq!(bus.pending_signals(), SIGNAL_CONTROL);
        assert!(line.is_asserted());

        assert!(bus.drain_ack(QueueId::Control).is_some());
        assert_eq!(bus.pending_signals(), 0);
        assert!(!line.is_asserted());
        assert!(bus.drain_ack(QueueId::Control).is_none());
    }

    #[test]
    fn cleanup_purges_both_queues_and_drops_line() {
        let (line, bus) = bus();
        bus.send_data(1, b"d1").unwrap();
        bus.send_data(1, b"d2").unwrap();
        bus.send_control(b"c1").unwrap();
        bus.send_control(b"c2").unwrap();
        assert!(line.is_asserted());

        assert_eq!(bus.cleanup(), 4);

        assert!(bus.is_empty(QueueId::Data));
        assert!(bus.is_empty(QueueId::Control));
        assert!(!line.is_asserted());
        assert_eq!(bus.pending_signals(), 0);
        assert_eq!(bus.stats().messages_purged, 4);
    }

    #[test]
    fn cleanup_twice_is_harmless() {
        let (line, bus) = bus();
        bus.send_control(b"c").unwrap();

        assert_eq!(bus.cleanup(), 1);
        assert_eq!(bus.cleanup(), 0);
        assert!(!line.is_asserted());
    }

    #[test]
    fn init_resets_queues_and_starts_transport() {
        let (_line, bus) = bus();
        bus.send_data(0, b"stale").unwrap();
        let mut transport = CountingTransport {
            inits: 0,
            fail: false,
        };

        bus.init(&mut transport).unwrap();

        assert_eq!(transport.inits, 1);
        assert!(bus.is_empty(QueueId::Data));
    }

    #[test]
    fn init_propagates_transport_failure_verbatim() {
        let (_line, bus) = bus();
        let mut transport = CountingTransport {
            inits: 0,
            fail: true,
        };

        let err = bus.init(&mut transport).unwrap_err();

        assert!(matches!(
            err,
            BusError::Transport(TransportError::Init(ref msg)) if msg == "i2c slave address busy"
        ));
        assert_eq!(err.to_string(), "transport init failed: i2c slave address busy");
    }

    #[test]
    fn router_can_reply_on_same_bus() {
        let (line, bus) = bus();
        let replies = AtomicUsize::new(0);
        let router = |cport: u8, payload: &[u8]| {
            bus.send_data(cport, payload).unwrap();
            replies.fetch_add(1, Ordering::SeqCst);
        };

        bus.receive(&inbound(9, 4, b"echo"), &router).unwrap();

        assert_eq!(replies.load(Ordering::SeqCst), 1);
        let reply = bus.drain_ack(QueueId::Data).unwrap();
        assert_eq!(reply.as_bytes()[1], 9);
        assert_eq!(&reply.as_bytes()[HEADER_SIZE..], b"echo");
        assert!(!line.is_asserted());
    }

    #[test]
    fn concurrent_senders_and_drainer_keep_line_consistent() {
        let line = Arc::new(MemoryLine::new());
        let bus = Arc::new(SliceBus::new(Arc::clone(&line)));
        let per_thread = 200usize;

        let producers: Vec<_> = (0..2u8)
            .map(|cport| {
                let bus = Arc::clone(&bus);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        if cport == 0 {
                            bus.send_data(cport, format!("d{i}").as_bytes()).unwrap();
                        } else {
                            bus.send_control(format!("c{i}").as_bytes()).unwrap();
                        }
                    }
                })
            })
            .collect();

        let drainer = {
            let bus = Arc::clone(&bus);
            std::thread::spawn(move || {
                let mut seen = [Vec::new(), Vec::new()];
                while seen[0].len() + seen[1].len() < per_thread * 2 {
                    for (slot, queue) in [QueueId::Data, QueueId::Control].into_iter().enumerate() {
                        if let Some(message) = bus.drain_ack(queue) {
                            seen[slot].push(message.into_bytes());
                        }
                    }
                }
                seen
            })
        };

        for producer in producers {
            producer.join().unwrap();
        }
        let [data, control] = drainer.join().unwrap();

        for (i, frame) in data.iter().enumerate() {
            assert_eq!(&frame[HEADER_SIZE..], format!("d{i}").as_bytes());
        }
        for (i, message) in control.iter().enumerate() {
            assert_eq!(message.as_ref(), format!("c{i}").as_bytes());
        }
        assert_eq!(bus.pending_signals(), 0);
        assert!(!line.is_asserted());
    }

    #[test]
    fn hex_dump_formats_bytes() {
        assert_eq!(HexDump(&[0x00, 0xAB, 0x7F]).to_string(), "00 ab 7f");
        assert_eq!(HexDump(&[]).to_string(), "");
    }
}
