//! Normalized errors for log window service calls.
//!
//! Transport details stay behind the service; callers only see categories
//! they can act on. Every variant is recoverable.

/// Error returned by a `LogWindowService` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogServiceError {
    /// The request was rejected (bad file name, bad limit).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The service could not be reached.
    #[error("log service unavailable: {message}")]
    Unavailable { message: String },

    /// The service answered with a non-success status.
    #[error("log service returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// Reading the underlying log failed.
    #[error("io: {message}")]
    Io { message: String },
}

impl LogServiceError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::Io { .. } => true,
            Self::Status { code, .. } => *code >= 500,
            Self::InvalidArgument { .. } => false,
        }
    }
}

impl From<std::io::Error> for LogServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_operator_readable() {
        let err = LogServiceError::Status {
            code: 401,
            message: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "log service returned status 401: unauthorized");
    }

    #[test]
    fn retryable_categories() {
        assert!(LogServiceError::Unavailable {
            message: "down".into()
        }
        .is_retryable());
        assert!(LogServiceError::Status {
            code: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!LogServiceError::Status {
            code: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!LogServiceError::InvalidArgument {
            message: "bad".into()
        }
        .is_retryable());
    }
}
