use thiserror::Error;

/// The taxonomy of failure kinds a Manager client can observe. Transport
/// failures are retried by the caller; the rest are returned so the caller
/// can decide whether to log-and-skip or abort.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("manager unreachable at {0}")]
    Unreachable(String),
    #[error("authentication with the manager failed")]
    AuthFailed,
    #[error("disconnected from the manager")]
    Disconnected,
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
