use std::path::PathBuf;

/// Errors that can occur at the transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device.
    #[error("failed to open {device}: {source}")]
    Open {
        device: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply line settings to an opened device.
    #[error("failed to configure {device}: {source}")]
    Configure {
        device: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device accepted zero bytes of a write.
    #[error("device accepted 0 of {len} bytes")]
    WriteZero { len: usize },

    /// The transport was used before `open` or after `close`.
    #[error("transport is not open")]
    NotOpen,
}

impl TransportError {
    /// True when a read failed only because no data was ready yet.
    pub fn is_would_block(&self) -> bool {
        matches!(
            self,
            TransportError::Io(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::Interrupted
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
