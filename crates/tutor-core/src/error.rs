//! Error types for the offline host

use thiserror::Error;

/// Result type alias for host operations
pub type TutorResult<T> = Result<T, TutorError>;

/// Main error type for the offline host
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker error: {0}")]
    Worker(#[from] tutor_sw::SwError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TutorError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TutorError::config("cache_name is empty").to_string(),
            "Configuration error: cache_name is empty"
        );

        let err: TutorError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, TutorError::Url(_)));
    }

    #[test]
    fn test_from_worker_error() {
        let err: TutorError = tutor_sw::SwError::NotFound("math-tutor-v1".into()).into();
        assert_eq!(err.to_string(), "Worker error: Not found: math-tutor-v1");
    }
}
