use bytes::{BufMut, Bytes};

use crate::channel::{self, DEFAULT_NUM_CPORTS};
use crate::checksum;
use crate::error::{FrameError, Result};

/// Frame header: checksum (1) + host cport (1) + local cport (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Checksum field value that tells the receiver not to validate the frame.
///
/// Lets the base push hand-built frames while debugging. It also means a
/// peer that zeroes the byte disables integrity checking for that frame.
pub const CHECKSUM_BYPASS: u8 = 0;

/// Default maximum frame size (header included): 4 KiB.
pub const DEFAULT_MAX_FRAME: usize = 4 * 1024;

/// A validated inbound frame borrowed from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw checksum byte as received.
    pub checksum: u8,
    /// Cport the base used to address this frame.
    pub host_cport: u8,
    /// Module-side bundle cport.
    pub local_cport: u8,
    /// Everything after the header.
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Whether the sender asked for checksum validation.
    pub fn checksum_checked(&self) -> bool {
        self.checksum != CHECKSUM_BYPASS
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────┬─────────────┬─────────────────┐
/// │ Checksum(1B) │ Host cport │ Local cport │ Payload         │
/// │ sum → 0      │ (1B)       │ (1B)        │ (N bytes)       │
/// └──────────────┴────────────┴─────────────┴─────────────────┘
/// ```
///
/// The buffer is reserved up front; if that fails nothing is built and
/// `FrameError::OutOfMemory` is returned.
pub fn encode_frame(host_cport: u8, local_cport: u8, payload: &[u8]) -> Result<Bytes> {
    let size = HEADER_SIZE + payload.len();
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| FrameError::OutOfMemory { size })?;

    buf.put_u8(0);
    buf.put_u8(host_cport);
    buf.put_u8(local_cport);
    buf.put_slice(payload);
    buf[0] = checksum::compute(&buf);

    Ok(Bytes::from(buf))
}

/// Decode and validate a complete inbound frame.
///
/// Checks run in wire order: length, checksum (unless bypassed), then the
/// local cport range. Nothing is consumed or modified.
pub fn decode_frame<'a>(src: &'a [u8], config: &FrameConfig) -> Result<Frame<'a>> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::Truncated { len: src.len() });
    }
    if src.len() > config.max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: src.len(),
            max: config.max_frame_size,
        });
    }

    let checksum = src[0];
    if checksum != CHECKSUM_BYPASS && !checksum::validate(src) {
        return Err(FrameError::ChecksumMismatch {
            sum: checksum::sum(src),
        });
    }

    let local_cport = src[2];
    if !channel::is_valid(local_cport, config.num_cports) {
        return Err(FrameError::InvalidCport {
            cport: local_cport,
            max: config.num_cports,
        });
    }

    Ok(Frame {
        checksum,
        host_cport: src[1],
        local_cport,
        payload: &src[HEADER_SIZE..],
    })
}

/// Limits applied when decoding frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Number of local cports; valid cports are `0..num_cports`.
    pub num_cports: usize,
    /// Maximum frame size in bytes, header included. Default: 4 KiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            num_cports: DEFAULT_NUM_CPORTS,
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}
