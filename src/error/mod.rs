use thiserror::Error;

use crate::step::StepId;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message schema validation errors raised by `Conversation::from_mmd`
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Message {index} is not a mapping")]
    NotAMapping { index: usize },

    #[error("Message {index} is invalid: {source}")]
    InvalidMessage {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to extract a score from a score message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreParseError {
    #[error("no line contains \"Total Score:\"")]
    MissingMarker,

    #[error("invalid score value {value:?}")]
    InvalidNumber { value: String },
}

/// Failure to extract a terminal decision from a terminal check message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerminalParseError {
    #[error("neither \"TERMINAL: YES\" nor \"TERMINAL: NO\" found")]
    MissingMarker,
}

/// Step tree structure errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("Step not found: {0}")]
    StepNotFound(StepId),

    #[error("Step {0} is not a reasoning step")]
    NotAReasoningStep(StepId),

    #[error("Parent chain starting at step {0} does not reach the root")]
    CycleDetected(StepId),

    #[error("Invalid tree structure: {message}")]
    InvalidStructure { message: String },
}

/// Tree file storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported tree file version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid tree: {0}")]
    Invalid(#[from] TreeError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "bad LABEL_WIDTH".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: bad LABEL_WIDTH");
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::NotAMapping { index: 2 };
        assert_eq!(err.to_string(), "Message 2 is not a mapping");

        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = SchemaError::InvalidMessage { index: 0, source };
        assert!(err.to_string().starts_with("Message 0 is invalid: "));
    }

    #[test]
    fn test_parse_error_display() {
        assert_eq!(
            ScoreParseError::MissingMarker.to_string(),
            "no line contains \"Total Score:\""
        );
        let err = ScoreParseError::InvalidNumber {
            value: "seven".to_string(),
        };
        assert_eq!(err.to_string(), "invalid score value \"seven\"");
        assert_eq!(
            TerminalParseError::MissingMarker.to_string(),
            "neither \"TERMINAL: YES\" nor \"TERMINAL: NO\" found"
        );
    }

    #[test]
    fn test_tree_error_display() {
        assert_eq!(
            TreeError::StepNotFound(StepId(7)).to_string(),
            "Step not found: 7"
        );
        assert_eq!(
            TreeError::NotAReasoningStep(StepId(0)).to_string(),
            "Step 0 is not a reasoning step"
        );
        assert_eq!(
            TreeError::CycleDetected(StepId(3)).to_string(),
            "Parent chain starting at step 3 does not reach the root"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported tree file version: 9 (expected 1)"
        );

        let err = StorageError::Io {
            path: "trees/a.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "I/O error on trees/a.json: missing");
    }

    #[test]
    fn test_tree_error_conversion_to_storage_error() {
        let storage_err: StorageError = TreeError::StepNotFound(StepId(1)).into();
        assert!(matches!(storage_err, StorageError::Invalid(_)));
    }

    #[test]
    fn test_conversions_to_app_error() {
        let app_err: AppError = SchemaError::NotAMapping { index: 0 }.into();
        assert!(matches!(app_err, AppError::Schema(_)));

        let app_err: AppError = TreeError::NotAReasoningStep(StepId(0)).into();
        assert!(matches!(app_err, AppError::Tree(_)));

        let storage_err = StorageError::UnsupportedVersion {
            found: 2,
            expected: 1,
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
