// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the selector engine
//!
//! Selector errors are fatal and synchronous: the engine never swallows them.
//! An empty result is never reported as an error.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// The tokenizer could not consume the rest of the selector
    #[error("Syntax error, unrecognized expression: {remainder}")]
    Syntax { selector: String, remainder: String },

    /// A pseudo-class name that no filter is registered for
    #[error("Syntax error, unsupported pseudo: {name}")]
    UnsupportedPseudo { selector: String, name: String },

    /// A pseudo-class argument that cannot be interpreted
    #[error("Invalid argument for :{pseudo}: '{argument}'")]
    InvalidArgument { pseudo: String, argument: String },

    /// `:not` / `:has` nested deeper than the configured limit
    #[error("Selector '{selector}' nests deeper than {limit} levels")]
    NestingTooDeep { selector: String, limit: usize },

    /// HTML parsing failed
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a syntax error for the unparsed `remainder` of `selector`
    pub fn syntax(selector: impl Into<String>, remainder: impl Into<String>) -> Self {
        Error::Syntax {
            selector: selector.into(),
            remainder: remainder.into(),
        }
    }

    /// Create an unsupported pseudo error
    pub fn unsupported_pseudo(selector: impl Into<String>, name: impl Into<String>) -> Self {
        Error::UnsupportedPseudo {
            selector: selector.into(),
            name: name.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(pseudo: impl Into<String>, argument: impl Into<String>) -> Self {
        Error::InvalidArgument {
            pseudo: pseudo.into(),
            argument: argument.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error comes from a malformed selector
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. }
                | Error::UnsupportedPseudo { .. }
                | Error::InvalidArgument { .. }
                | Error::NestingTooDeep { .. }
        )
    }

    /// Get the offending selector if available
    pub fn selector(&self) -> Option<&str> {
        match self {
            Error::Syntax { selector, .. } => Some(selector),
            Error::UnsupportedPseudo { selector, .. } => Some(selector),
            Error::NestingTooDeep { selector, .. } => Some(selector),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}
