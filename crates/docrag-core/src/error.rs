use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Model provider error: {0}")]
    Provider(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
