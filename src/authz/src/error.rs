//! Error types for the authorization engine

use thiserror::Error;

use crate::delegation::ValidationError;
use crate::expression::MatcherError;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid policy definition
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Malformed attribute expression
    #[error("Matcher error: {0}")]
    Matcher(#[from] MatcherError),

    /// A delegation grant was rejected by the validator
    #[error("Delegation validation failed: {0}")]
    DelegationValidationFailed(#[from] ValidationError),

    /// Delegation not found
    #[error("Delegation not found: {0}")]
    DelegationNotFound(String),

    /// Repository (storage backend) failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthzError {
    fn from(err: anyhow::Error) -> Self {
        AuthzError::Repository(format!("{:#}", err))
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
