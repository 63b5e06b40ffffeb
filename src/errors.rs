use thiserror::Error;
use uuid::Uuid;

/// A message payload that cannot be interpreted. Callers treat this as
/// "no task" and skip the message rather than crash the agent loop.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("payload does not contain a task")]
    NotATask,
}

/// The bus cannot deliver. Surfaced to the caller so an operator-level
/// process can retry with backoff; never retried internally.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("event bus is closed")]
    Closed,
}

/// An external capability (LLM, search) failed. Workers catch this and
/// convert it into a task-level FAILED status.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Decode(String),
}

/// Errors from the shared task store.
#[derive(Debug, Clone, Error)]
pub enum BlackboardError {
    #[error("duplicate task id: {0}")]
    Duplicate(Uuid),
    #[error("task not found: {0}")]
    NotFound(Uuid),
}
