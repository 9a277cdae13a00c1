//! Error types for landscape generation, fire runs and result persistence
//!
//! All engine errors are local and recoverable by the caller: regenerate the
//! landscape, re-enter the parameter text, or pick another output path.
//! Cancellation is deliberately not an error; see
//! [`RunOutcome::Cancelled`](crate::simulation::RunOutcome::Cancelled).

use std::fmt;

/// Errors raised by the fire simulation engine
#[derive(Debug)]
pub enum SimError {
    /// The landscape cannot be simulated in its current state
    /// (for example it holds no flammable cells, so the burned fraction is undefined)
    InvalidState(String),
    /// Ignition was requested on a landscape without any flammable cell left
    NoIgnitionCandidates,
    /// A user supplied parameter could not be parsed or is out of range
    InvalidInput {
        /// Name of the offending parameter (e.g. `"humidity"`)
        field: &'static str,
        /// Description of the problem
        message: String,
    },
    /// A configuration value is inconsistent (zero-sized grid, empty value set, ...)
    InvalidConfig(String),
    /// Failed to parse or serialize a configuration file
    Serialization(String),
    /// Underlying I/O failure while reading or writing results
    Io(std::io::Error),
}

impl SimError {
    /// Create an invalid-input error for a named parameter.
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        SimError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidState(msg) => write!(f, "Invalid simulation state: {msg}"),
            SimError::NoIgnitionCandidates => {
                write!(f, "No flammable cell left to ignite in this landscape")
            }
            SimError::InvalidInput { field, message } => {
                write!(f, "Invalid value for {field}: {message}")
            }
            SimError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            SimError::Serialization(msg) => write!(f, "Failed to (de)serialize: {msg}"),
            SimError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Serialization(e.to_string())
    }
}
