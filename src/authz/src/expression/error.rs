//! Error types for attribute expressions

use thiserror::Error;

/// Expression parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatcherError {
    #[error("Expression is empty")]
    EmptyExpression,

    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("Unexpected token '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Unknown path root '{0}' (expected subject, resource or domain)")]
    UnknownRoot(String),

    #[error("Path '{0}' must name an attribute")]
    IncompletePath(String),

    #[error("Expression nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}

/// Result type for expression operations
pub type Result<T> = std::result::Result<T, MatcherError>;
