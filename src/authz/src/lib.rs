//! # CretoAI Policy Engine
//!
//! Authorization policy evaluation with permission delegation.
//!
//! ## Features
//!
//! - **Multiple authorization models**: ACL, RBAC (with per-domain roles), ABAC, RESTful paths
//! - **Composite matching** of several models with OR semantics
//! - **Deterministic conflict resolution**: deny-override or priority-ranked
//! - **Attribute expressions** with a concurrent parse cache
//! - **Delegation** of a subset of one subject's permissions to another, with
//!   escalation and cycle checks
//!
//! ## Example
//!
//! ```rust
//! use cretoai_policy::{Action, Effect, Policy, PolicyEvaluator, PolicyRule, Resource, Subject};
//!
//! let policy = Policy::new(vec![
//!     PolicyRule::allow("role:editor", "post:*", "edit"),
//!     PolicyRule::deny("*", "post:archived", "edit"),
//! ]);
//! let evaluator = PolicyEvaluator::rbac();
//! let alice = Subject::new("alice").with_roles(["editor"]);
//!
//! let edit = Action::new("edit");
//! assert_eq!(evaluator.evaluate(&policy, &alice, &Resource::new("post:456"), &edit, None), Effect::Allow);
//! assert_eq!(evaluator.evaluate(&policy, &alice, &Resource::new("post:archived"), &edit, None), Effect::Deny);
//! ```

pub mod config;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod expression; // Attribute expression language
pub mod matcher;
pub mod pattern;
pub mod policy;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use types::{Action, Domain, Resource, Subject};
pub use policy::{Effect, Policy, PolicyRecord, PolicyRepository, PolicyRule, Priority};
pub use engine::{Decision, PolicyEvaluator};
pub use config::{AuthorizationModel, AuthzConfig, DelegationConfig, EvaluatorConfig, ResolutionStrategy};
pub use delegation::{Delegation, DelegationGrant, DelegationManager, DelegationRepository, ValidationError};
pub use error::{AuthzError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
