use thiserror::Error;

/// Failures surfaced by the completion engine and daemon boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unknown request type")]
    UnknownRequestType,

    #[error("failed to load completion spec: {0}")]
    SpecLoad(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
