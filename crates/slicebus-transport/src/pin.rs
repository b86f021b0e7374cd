use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::trace;

use crate::traits::InterruptLine;

/// An interrupt line that lives in memory.
///
/// Records the current level plus how often it was driven and how often the
/// level actually changed. Share it through an `Arc` to observe the level
/// from outside the bus.
#[derive(Debug, Default)]
pub struct MemoryLine {
    level: AtomicBool,
    drives: AtomicUsize,
    transitions: AtomicUsize,
}

impl MemoryLine {
    /// Create a deasserted line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of the line.
    pub fn is_asserted(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Number of times the line was driven, whatever the level.
    pub fn drives(&self) -> usize {
        self.drives.load(Ordering::SeqCst)
    }

    /// Number of level changes observed.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }
}

impl InterruptLine for MemoryLine {
    fn drive(&self, asserted: bool) {
        self.drives.fetch_add(1, Ordering::SeqCst);
        let previous = self.level.swap(asserted, Ordering::SeqCst);
        if previous != asserted {
            self.transitions.fetch_add(1, Ordering::SeqCst);
            trace!(asserted, "interrupt line changed level");
        }
    }
}
