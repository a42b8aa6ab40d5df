//! Error types for the `zed-typegen` binary.

use std::fmt;

/// Top-level CLI failures.
///
/// Each wraps the report of the layer that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration or logging setup was invalid.
    Configuration,
    /// The definitions could not be generated.
    Generation,
    /// The generated definitions could not be written.
    Output { destination: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "invalid configuration"),
            Self::Generation => write!(f, "failed to generate TypeScript definitions"),
            Self::Output { destination } => {
                write!(f, "failed to write definitions to {destination}")
            }
        }
    }
}

impl std::error::Error for CliError {}
