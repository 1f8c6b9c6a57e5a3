//! # Tutor Common
//!
//! Host-side plumbing shared by the tutor offline crates: subscriber setup,
//! install retries, and event keep-alive bounds.

use std::time::Duration;
use thiserror::Error;

pub mod logging;
pub mod retry;

pub use logging::{init_logging, LogConfig, LogFormat};
pub use retry::{retry_with_backoff, retry_with_backoff_when, with_timeout, RetryConfig};

/// Error type for shared host utilities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// An event outlived its keep-alive bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A flag or setting could not be parsed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A global subscriber was already installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type alias for shared utilities.
pub type Result<T> = std::result::Result<T, CommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CommonError::Timeout(Duration::from_millis(1500)).to_string(),
            "Operation timed out after 1.5s"
        );
        assert_eq!(
            CommonError::InvalidArgument("--log-format xml".into()).to_string(),
            "Invalid argument: --log-format xml"
        );
        assert_eq!(
            CommonError::Logging("subscriber already set".into()).to_string(),
            "Logging setup failed: subscriber already set"
        );
    }
}
