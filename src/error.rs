//! Error types for gitnova
//!
//! Each subsystem owns its own error enum; `GitnovaError` wraps them for the
//! few call sites that cross subsystem boundaries.

use thiserror::Error;

use crate::store::StoreError;

/// All error types that can occur in gitnova
#[derive(Debug, Error)]
pub enum GitnovaError {
    /// A required secret is absent from the environment
    #[error("Missing required secret: environment variable {env_var} not set")]
    MissingSecret { env_var: String },

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Persistent store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for gitnova operations
pub type Result<T> = std::result::Result<T, GitnovaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_error() {
        let err = GitnovaError::MissingSecret {
            env_var: "GROQ_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required secret: environment variable GROQ_API_KEY not set"
        );
    }

    #[test]
    fn test_config_error() {
        let err = GitnovaError::Config("judge.models must not be empty".to_string());
        assert_eq!(err.to_string(), "Config error: judge.models must not be empty");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: GitnovaError = StoreError::Backend("connection refused".to_string()).into();
        assert!(matches!(err, GitnovaError::Store(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(GitnovaError::Config("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
