//! Checksummed message framing and cport remapping for the slice/base link.
//!
//! Every message crossing the link is framed with a 3-byte header:
//! - A 1-byte additive checksum (the whole frame sums to zero mod 256)
//! - The host-side cport assigned by the base
//! - The local bundle cport on the module
//!
//! A checksum byte of zero tells the receiver to skip validation.

pub mod channel;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod remap;

pub use channel::{DEFAULT_NUM_CPORTS, MAX_NUM_CPORTS, UNMAPPED_HOST_CPORT};
pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, CHECKSUM_BYPASS, DEFAULT_MAX_FRAME,
    HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use remap::CportRemap;
