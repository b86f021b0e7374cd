use slicebus_transport::InterruptLine;
use tracing::trace;

/// Control (SVC) FIFO has messages for the base.
pub const SIGNAL_CONTROL: u8 = 0x01;

/// Data (UniPro) FIFO has messages for the base.
pub const SIGNAL_DATA: u8 = 0x02;

/// Every reason this bus raises.
pub const SIGNAL_ALL: u8 = SIGNAL_CONTROL | SIGNAL_DATA;

/// Pending interrupt reasons and the line they drive.
///
/// The line is driven after every change and is asserted exactly when at
/// least one reason is pending. Not synchronized on its own; callers hold
/// the bus lock across the whole update.
#[derive(Debug)]
pub struct SignalController<L> {
    pending: u8,
    driven: bool,
    line: L,
}

impl<L: InterruptLine> SignalController<L> {
    /// Create a controller with nothing pending and drive the line low.
    pub fn new(line: L) -> Self {
        line.drive(false);
        Self {
            pending: 0,
            driven: false,
            line,
        }
    }

    /// Set `mask` bits and (re-)drive the line.
    pub fn assert(&mut self, mask: u8) {
        self.pending |= mask;
        self.update();
    }

    /// Clear `mask` bits and drive the line low if nothing remains.
    pub fn deassert(&mut self, mask: u8) {
        self.pending &= !mask;
        self.update();
    }

    /// Currently pending reasons.
    pub fn pending(&self) -> u8 {
        self.pending
    }

    /// Level the line was last driven to.
    pub fn line_asserted(&self) -> bool {
        self.driven
    }

    fn update(&mut self) {
        let asserted = self.pending != 0;
        trace!(pending = self.pending, asserted, "driving interrupt line");
        self.line.drive(asserted);
        self.driven = asserted;
    }
}
