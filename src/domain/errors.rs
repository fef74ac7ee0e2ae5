use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("Detection failed: {0}")]
    DetectionFailed(String),
    #[error("Image file not readable. The file might be corrupted or in an unsupported format. Error: {0}")]
    ImageUnreadable(String),
    #[error("Detection timeout - file may be too large")]
    DetectionTimeout,
    #[error("Result file not found after detection")]
    ResultMissing,
    /// Se muestra la cadena completa de causas (`{:#}`).
    #[error("Server error: {0:#}")]
    Internal(anyhow::Error),
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Internal(e.into())
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        DomainError::Internal(e)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
