/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer is shorter than the frame header.
    #[error("frame truncated ({len} bytes, header needs 3)")]
    Truncated { len: usize },

    /// The buffer exceeds the configured maximum frame size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The frame bytes do not sum to zero.
    #[error("checksum mismatch (frame sums to {sum:#04x})")]
    ChecksumMismatch { sum: u8 },

    /// The frame names a local cport outside the supported range.
    #[error("invalid cport {cport} (supported 0..{max})")]
    InvalidCport { cport: u8, max: usize },

    /// A frame buffer could not be allocated.
    #[error("out of memory allocating {size} byte frame")]
    OutOfMemory { size: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
