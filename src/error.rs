//! Unified error type hierarchy for pbxpatch
//!
//! Provides structured error handling with PatchError, ConfigError and ParseError.
//! A missing anchor is never an error: it is reported through
//! [`crate::models::EditOutcome`].

use std::io;
use thiserror::Error;

/// Manifest patching operation errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Invalid regex pattern: {0}")]
    RegexInvalid(String),

    #[error("Manifest not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read manifest {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Manifest does not parse: {0}")]
    Malformed(#[from] ParseError),
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Structural parse failure, positioned at the offending token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Top-level result type for operations that may fail.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
