//! Delegation module
//!
//! Lets a subject hand a subset of its own permissions to another subject
//! for a limited time. Grants are authorized through the same policy
//! evaluator as ordinary requests, so nobody can delegate what they cannot
//! do themselves.
//!
//! # Features
//!
//! - **Scope Containment**: every (resource, action) pair is checked against the delegator's policy
//! - **Transitive Chains**: permissions received through a transitive delegation may be passed on
//! - **Cycle Detection**: breadth-first walk of the delegation graph with a depth limit
//! - **Lazy Expiry**: elapsed delegations stop counting immediately; a sweep persists the state later
//!
//! # Example
//!
//! ```rust
//! use cretoai_policy::config::DelegationConfig;
//! use cretoai_policy::delegation::{DelegationGrant, DelegationManager, InMemoryDelegationRepository};
//! use cretoai_policy::engine::PolicyEvaluator;
//! use cretoai_policy::policy::{InMemoryPolicyRepository, PolicyRule};
//! use cretoai_policy::types::Subject;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policies = InMemoryPolicyRepository::with_rules(vec![
//!     PolicyRule::allow("alice", "document:*", "read"),
//! ]);
//! let manager = DelegationManager::new(
//!     Arc::new(InMemoryDelegationRepository::new()),
//!     Arc::new(policies),
//!     Arc::new(PolicyEvaluator::rbac()),
//!     &DelegationConfig::default(),
//! );
//!
//! let alice = Subject::new("alice");
//! let delegation = manager
//!     .grant(&alice, "bob", DelegationGrant::new(["document:123"], ["read"]))
//!     .await?;
//!
//! assert_eq!(manager.active("bob").await?.len(), 1);
//! manager.revoke(&delegation.id).await?;
//! assert!(manager.active("bob").await?.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;
pub mod repository;
pub mod types;
pub mod validator;


pub use error::ValidationError;
pub use manager::DelegationManager;
pub use repository::{DelegationRepository, InMemoryDelegationRepository};
pub use types::{Delegation, DelegationGrant, DelegationScope, DelegationState};
pub use validator::DelegationValidator;
