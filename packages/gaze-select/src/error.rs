use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown selection method: {0}")]
    UnknownMethod(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Failed to decode message: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SelectError>;
