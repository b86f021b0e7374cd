use slicebus_frame::FrameError;
use slicebus_transport::TransportError;

/// Errors that can occur in bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// A message buffer or queue slot could not be allocated.
    #[error("out of memory queuing {size} byte message")]
    OutOfMemory { size: usize },

    /// The local cport is outside the configured range.
    #[error("invalid cport {cport} (supported 0..{max})")]
    InvalidCport { cport: u8, max: usize },

    /// The message would exceed the configured maximum frame size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport initialization failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;
