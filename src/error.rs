//! Error types for resource mapping and payload loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading mapping inputs (records or payloads).
#[derive(Debug, Error)]
pub enum InputError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while dumping a stored record to a resource document.
///
/// Unresolvable relationships are not errors; they degrade to omission.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("record must be an object, got {actual}")]
    InvalidRecord { actual: String },

    #[error("extractor \"{id}\" carries neither type_extractor nor regular_expression")]
    IncompleteExtractor { id: String },
}

/// Errors while loading a resource payload back into a stored record.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("payload has no data member")]
    MissingData,

    #[error("payload data must be an object, got {actual}")]
    InvalidData { actual: String },

    #[error("payload data has no type")]
    MissingType,

    #[error("resource type mismatch: expected {expected}, got {actual}")]
    WrongResourceType { expected: String, actual: String },

    #[error("payload attributes must be an object, got {actual}")]
    InvalidAttributes { actual: String },

    #[error("invalid attribute schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<AttributeError> },
}

/// Single attribute validation error.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AttributeError {
    /// Name of the offending attribute.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for AttributeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl InputError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            InputError::FileNotFound { .. } | InputError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            InputError::NetworkError { .. } => 3,
            InputError::InvalidJson { .. } => 2,
        }
    }
}

impl DumpError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Invalid { .. } => 1,
            _ => 2,
        }
    }
}
