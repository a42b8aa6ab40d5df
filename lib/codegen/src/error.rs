//! Error types for the codegen crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `SourceError`: Errors from reading a schema resource
//! - `GenerateError`: High-level wrapper naming the pipeline stage that failed

use std::fmt;

/// Errors from schema sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No resource exists under the given name.
    NotFound { name: String },
    /// The name is not a valid relative resource path.
    InvalidName { name: String, reason: String },
    /// The resource exists but could not be read.
    Unreadable { name: String, details: String },
    /// The resource content is not UTF-8 text.
    NotUtf8 { name: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "schema file '{name}' not found"),
            Self::InvalidName { name, reason } => {
                write!(f, "invalid schema file name '{name}': {reason}")
            }
            Self::Unreadable { name, details } => {
                write!(f, "failed to read schema file '{name}': {details}")
            }
            Self::NotUtf8 { name } => write!(f, "schema file '{name}' is not valid UTF-8"),
        }
    }
}

impl std::error::Error for SourceError {}

/// High-level generation errors.
///
/// Use these to add context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The schema resource could not be found or read.
    ReadError { file: String },
    /// The schema compiler rejected the schema text.
    SchemaCompilationError { file: String },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadError { file } => write!(f, "could not read schema '{file}'"),
            Self::SchemaCompilationError { file } => {
                write!(f, "error compiling schema '{file}'")
            }
        }
    }
}

impl std::error::Error for GenerateError {}
