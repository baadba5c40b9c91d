use antlink_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error: failure to open, or a fatal write failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A command argument violates the wire format. Nothing was enqueued.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The session has not been started, or has been stopped.
    #[error("session is not running")]
    NotRunning,

    /// `start` was called on a running session.
    #[error("session is already running")]
    AlreadyRunning,

    /// The I/O pump has terminated; outbound queues are closed.
    #[error("session I/O pump has terminated")]
    Disconnected,

    /// The transport was lost when spawning the I/O pump failed.
    #[error("transport is unavailable after a failed start")]
    TransportUnavailable,

    /// An execution unit could not be spawned.
    #[error("failed to spawn {unit} thread: {source}")]
    Spawn {
        unit: &'static str,
        source: std::io::Error,
    },

    /// An execution unit panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

impl SessionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SessionError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
