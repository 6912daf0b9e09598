//! Configuration error types.

use thiserror::Error;

use crate::transcript::WindowError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A boolean variable was not one of the accepted spellings.
    #[error("invalid boolean {name}='{value}': expected true/false, 1/0, yes/no or on/off")]
    InvalidBool { name: &'static str, value: String },

    /// A count that must be positive was zero.
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("model id must not be empty")]
    EmptyModel,

    #[error("invalid window settings: {0}")]
    Window(#[from] WindowError),
}
