use thiserror::Error;

/// Errors surfaced by the VAD controller and its collaborators.
#[derive(Debug, Error)]
pub enum VadError {
    #[error("vad pipeline is already running")]
    AlreadyRunning,

    #[error("cannot update options while running")]
    BusyRunning,

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("microphone unavailable: {0}")]
    MicUnavailable(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("io error: {0}")]
    IoFailed(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VadError>;
