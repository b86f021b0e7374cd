//! Additive byte checksum.
//!
//! The checksum is the two's-complement negation of the byte sum, so a frame
//! that carries it sums to zero modulo 256.

/// Wrapping sum of all bytes.
pub fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Checksum byte that makes `bytes` plus the checksum sum to zero.
pub fn compute(bytes: &[u8]) -> u8 {
    sum(bytes).wrapping_neg()
}

/// True if `bytes`, checksum included, sums to zero.
///
/// Callers decide separately whether a zero checksum field means the check
/// was skipped; this function always computes.
pub fn validate(bytes: &[u8]) -> bool {
    sum(bytes) == 0
}
