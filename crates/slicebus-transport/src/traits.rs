use std::sync::Arc;

use crate::error::Result;

/// The physical interrupt output toward the base.
///
/// Implementations only drive the pin; deciding the level is the job of the
/// signal controller that owns the pending-reason mask. `drive` is called
/// with the lock on that mask held, so it must not block.
pub trait InterruptLine {
    /// Drive the line to the asserted (`true`) or deasserted (`false`) level.
    fn drive(&self, asserted: bool);
}

impl<L: InterruptLine + ?Sized> InterruptLine for Arc<L> {
    fn drive(&self, asserted: bool) {
        (**self).drive(asserted)
    }
}

impl<L: InterruptLine + ?Sized> InterruptLine for Box<L> {
    fn drive(&self, asserted: bool) {
        (**self).drive(asserted)
    }
}

impl<L: InterruptLine + ?Sized> InterruptLine for &L {
    fn drive(&self, asserted: bool) {
        (**self).drive(asserted)
    }
}

/// The register-mapped peripheral that moves bytes between slice and base.
///
/// On reception the transport hands the filled buffer to the bus decoder;
/// when the base polls it drains the outbound FIFOs. Only bring-up is part
/// of this trait, the data path goes through the bus methods directly.
pub trait Transport {
    /// Bring up the peripheral. Called after the outbound FIFOs are reset.
    fn init(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }
}
