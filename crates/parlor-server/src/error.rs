//! Server error types.

/// Errors raised by the [`crate::ServerDriver`] while processing an event.
///
/// Problems caused by a client's frames are answered with an `Error` frame
/// instead; these errors mean the runtime fed the driver something it cannot
/// act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// Event refers to a session the driver never accepted, or already closed.
    #[error("session {0} not found")]
    SessionNotFound(u64),

    /// Runtime reported the same session twice.
    #[error("session {0} already exists")]
    SessionAlreadyExists(u64),

    /// A reply frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Errors that can occur in the server runtime.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error (invalid bind address, unreadable TLS files).
    ///
    /// Fatal: prevents startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport or network error.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Unexpected internal state.
    #[error("internal error: {0}")]
    Internal(String),

    /// Error from the Sans-IO driver.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
