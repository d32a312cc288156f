use crate::domain::keys::ParseKeyError;
use thiserror::Error;

/// Failures reported by a persistence provider.
///
/// A lookup miss is always `NotFound` so callers can tell it apart from a
/// query that failed outright.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("resource of type '{kind}', with URI: {uri} could not be found")]
    NotFound { kind: &'static str, uri: String },

    #[error("resource of type '{kind}', with URI: {uri} conflicts with stored data")]
    Conflict { kind: &'static str, uri: String },

    #[error("error during query: {message}")]
    Query { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, uri: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            uri: uri.into(),
        }
    }

    pub fn conflict(kind: &'static str, uri: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            uri: uri.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    ParseError(#[from] ParseKeyError),

    #[error("file could not be read: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path} could not be unmarshaled to DTO {dto}")]
    InvalidJsonError {
        path: String,
        dto: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("error during question: {question}")]
    QuestionFailed { question: String },

    #[error("failed to confirm action: {action}")]
    ConfirmationFailed { action: String },

    #[error("repository operation '{operation}' failed: {source}")]
    RepositoryError {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn repository(operation: &'static str, source: RepositoryError) -> Self {
        Self::RepositoryError { operation, source }
    }

    /// Message safe to show an operator; internal failures are not spelled out.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ParseError(e) => e.to_string(),
            Self::FileReadError { path, .. } | Self::InvalidJsonError { path, .. } => {
                format!("Could not load file at '{}', is it valid JSON?", path)
            }
            Self::QuestionFailed { .. } => "Failed to read questions responses!".to_string(),
            Self::ConfirmationFailed { .. } => "Aborted due to failed confirmation!".to_string(),
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => self.to_string(),
            Self::RepositoryError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                "Whoopsie, an unexpected error occurred, see logs!".to_string()
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfirmationFailed { .. } => 0,
            Self::ParseError(_)
            | Self::FileReadError { .. }
            | Self::InvalidJsonError { .. }
            | Self::QuestionFailed { .. } => 2,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => 78,
            Self::RepositoryError { .. } | Self::IoError(_) | Self::SerializationError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
