//! Delegation validation errors

use thiserror::Error;

/// Reasons a delegation grant is rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The delegator cannot perform the action itself
    #[error("Delegator does not hold '{action}' on '{resource}'")]
    PermissionNotHeld { resource: String, action: String },

    /// The grant would close a loop of delegations
    #[error("Cyclical delegation detected: {}", chain.join(" -> "))]
    CyclicalDelegation { chain: Vec<String> },

    /// The delegation chain above the delegator is longer than allowed
    #[error("Delegation chain exceeds maximum depth of {limit}")]
    ChainDepthExceeded { limit: usize },

    /// No resources or no actions were given
    #[error("Delegation scope must name at least one resource and one action")]
    EmptyScope,
}
