//! Error types and handling for source transformation operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for transformation operations
#[derive(Debug, Error)]
pub enum RecastError {
    /// Parse errors from the source frontend
    #[error("Parse error: {message} at line {line}, column {col}")]
    ParseError { message: String, line: u32, col: u32 },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Rule execution errors raised while processing a node
    #[error("Rule error in '{rule}': {message}")]
    RuleError { rule: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache-related errors
    #[error("Cache error: {message}")]
    CacheError { message: String },

    /// Syntax tree structural errors (aliasing, detached nodes, invalid handles)
    #[error("Tree error: {message}")]
    TreeError { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Rule,
    Io,
    Cache,
    Tree,
    Internal,
}

impl RecastError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecastError::ParseError { .. } => ErrorKind::Parse,
            RecastError::ConfigError { .. } => ErrorKind::Config,
            RecastError::RuleError { .. } => ErrorKind::Rule,
            RecastError::IoError { .. } => ErrorKind::Io,
            RecastError::CacheError { .. } => ErrorKind::Cache,
            RecastError::TreeError { .. } => ErrorKind::Tree,
            RecastError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Rule | ErrorKind::Cache
        )
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, line: u32, col: u32) -> Self {
        Self::ParseError {
            message: message.into(),
            line,
            col,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule_error(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleError {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a cache error
    pub fn cache_error(message: impl Into<String>) -> Self {
        Self::CacheError {
            message: message.into(),
        }
    }

    /// Create a tree error
    pub fn tree_error(message: impl Into<String>) -> Self {
        Self::TreeError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RecastError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
