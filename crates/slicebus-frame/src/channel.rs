//! Cport numbering limits.
//!
//! Local cports are the module's bundle channels. Host cports are whatever
//! the base assigned; the two are related only through [`CportRemap`].
//!
//! [`CportRemap`]: crate::remap::CportRemap

/// Number of local cports supported when nothing else is configured.
pub const DEFAULT_NUM_CPORTS: usize = 16;

/// Cport fields are one byte on the wire.
pub const MAX_NUM_CPORTS: usize = 256;

/// Host cport written into frames for a local cport the base never used.
pub const UNMAPPED_HOST_CPORT: u8 = 0;

/// Returns true if `cport` is addressable with `num_cports` local cports.
pub fn is_valid(cport: u8, num_cports: usize) -> bool {
    usize::from(cport) < num_cports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range_is_half_open() {
        assert!(is_valid(0, DEFAULT_NUM_CPORTS));
        assert!(is_valid(15, DEFAULT_NUM_CPORTS));
        assert!(!is_valid(16, DEFAULT_NUM_CPORTS));
        assert!(is_valid(255, MAX_NUM_CPORTS));
        assert!(!is_valid(0, 0));
    }
}
