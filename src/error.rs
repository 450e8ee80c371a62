use thiserror::Error;

/// Errors surfaced by the session layer.
///
/// The correlation primitives themselves ([`MessageIdGenerator`](crate::MessageIdGenerator)
/// and [`ListenerRegistry`](crate::ListenerRegistry)) never fail. A missing
/// listener is a normal outcome, not an error.
#[derive(Error, Debug)]
pub enum RpcError {
    /// No matching update arrived before the waiter's deadline
    #[error("timed out waiting for update")]
    Timeout,

    /// The waiter was dropped from the registry without being resolved
    /// (session shutdown)
    #[error("listener cancelled before an update arrived")]
    Cancelled,

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session configuration rejected at construction time
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, RpcError>;
