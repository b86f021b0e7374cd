use crate::channel::{self, MAX_NUM_CPORTS, UNMAPPED_HOST_CPORT};
use crate::error::{FrameError, Result};

/// Local cport to host cport mapping learned from inbound traffic.
///
/// There is no handshake: every inbound frame overwrites the host cport
/// for its local cport, and outbound frames on that local cport reuse it.
#[derive(Debug, Clone)]
pub struct CportRemap {
    entries: Vec<Option<u8>>,
}

impl CportRemap {
    /// Create a table for local cports `0..num_cports`.
    ///
    /// `num_cports` is clamped to [`MAX_NUM_CPORTS`].
    pub fn new(num_cports: usize) -> Self {
        Self {
            entries: vec![None; num_cports.min(MAX_NUM_CPORTS)],
        }
    }

    /// Number of local cports this table covers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table covers no cports at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remember `host_cport` as the base-side id for `local_cport`.
    pub fn record(&mut self, local_cport: u8, host_cport: u8) -> Result<()> {
        let slot = self.slot_mut(local_cport)?;
        *slot = Some(host_cport);
        Ok(())
    }

    /// Host cport to use for `local_cport`.
    ///
    /// Returns [`UNMAPPED_HOST_CPORT`] if the base never sent on that cport.
    pub fn lookup(&self, local_cport: u8) -> Result<u8> {
        Ok(self.get(local_cport)?.unwrap_or(UNMAPPED_HOST_CPORT))
    }

    /// Recorded host cport, or `None` if nothing arrived on `local_cport` yet.
    pub fn get(&self, local_cport: u8) -> Result<Option<u8>> {
        self.check(local_cport)?;
        Ok(self.entries[usize::from(local_cport)])
    }

    /// Forget every mapping.
    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }

    fn slot_mut(&mut self, local_cport: u8) -> Result<&mut Option<u8>> {
        self.check(local_cport)?;
        Ok(&mut self.entries[usize::from(local_cport)])
    }

    fn check(&self, local_cport: u8) -> Result<()> {
        if channel::is_valid(local_cport, self.entries.len()) {
            Ok(())
        } else {
            Err(FrameError::InvalidCport {
                cport: local_cport,
                max: self.entries.len(),
            })
        }
    }
}
