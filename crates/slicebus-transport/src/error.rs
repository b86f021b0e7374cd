/// Errors reported by the transport collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peripheral could not be brought up.
    #[error("transport init failed: {0}")]
    Init(String),

    /// An I/O error occurred on the underlying peripheral.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
