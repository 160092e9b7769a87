//! Engine and delegation configuration
//!
//! All settings have defaults and can be deserialized from a host
//! application's config file or read from the environment:
//!
//! - `AUTHZ_MODEL` - `acl`, `rbac`, `abac`, `restful`, or a comma list for a composite (default: rbac)
//! - `AUTHZ_RESOLVER` - `standard` or `priority` (default: standard)
//! - `AUTHZ_DELEGATION_MAX_DEPTH` - delegation chain walk limit (default: 10)
//! - `AUTHZ_DELEGATION_RETENTION_SECS` - age after which revoked/expired delegations are purged (default: 30 days)

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AuthzError, Result};

const DEFAULT_MAX_CHAIN_DEPTH: usize = 10;
const DEFAULT_RETENTION_SECS: u64 = 30 * 24 * 60 * 60;

/// Authorization model used to match rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationModel {
    Acl,
    Rbac,
    Abac,
    Restful,
    /// Any of the listed models may accept a rule
    Composite(Vec<AuthorizationModel>),
}

impl Default for AuthorizationModel {
    fn default() -> Self {
        AuthorizationModel::Rbac
    }
}

impl FromStr for AuthorizationModel {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();

        if parts.len() > 1 {
            let models = parts
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<AuthorizationModel>>>()?;
            return Ok(AuthorizationModel::Composite(models));
        }

        match parts.first().map(|p| p.to_ascii_lowercase()).as_deref() {
            Some("acl") => Ok(AuthorizationModel::Acl),
            Some("rbac") => Ok(AuthorizationModel::Rbac),
            Some("abac") => Ok(AuthorizationModel::Abac),
            Some("restful") | Some("rest") => Ok(AuthorizationModel::Restful),
            _ => Err(AuthzError::Config(format!("unknown authorization model '{}'", s))),
        }
    }
}

/// Conflict resolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Deny overrides allow
    #[default]
    Standard,
    /// Highest priority rule wins
    Priority,
}

impl FromStr for ResolutionStrategy {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "deny-override" => Ok(ResolutionStrategy::Standard),
            "priority" => Ok(ResolutionStrategy::Priority),
            _ => Err(AuthzError::Config(format!("unknown resolution strategy '{}'", s))),
        }
    }
}

/// Policy evaluator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Rule matching model
    pub model: AuthorizationModel,

    /// Conflict resolution strategy
    pub strategy: ResolutionStrategy,
}

/// Delegation subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// Maximum number of delegation hops walked when checking for cycles
    pub max_chain_depth: usize,

    /// Seconds a revoked or expired delegation is kept before cleanup purges it
    pub retention_secs: u64,
}

impl DelegationConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            retention_secs: DEFAULT_RETENTION_SECS,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub evaluator: EvaluatorConfig,
    pub delegation: DelegationConfig,
}

impl AuthzConfig {
    /// Read configuration from `AUTHZ_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = lookup("AUTHZ_MODEL") {
            config.evaluator.model = model.parse()?;
        }
        if let Some(strategy) = lookup("AUTHZ_RESOLVER") {
            config.evaluator.strategy = strategy.parse()?;
        }
        if let Some(depth) = lookup("AUTHZ_DELEGATION_MAX_DEPTH") {
            config.delegation.max_chain_depth = depth.trim().parse().map_err(|_| {
                AuthzError::Config(format!("AUTHZ_DELEGATION_MAX_DEPTH must be an integer, got '{}'", depth))
            })?;
        }
        if let Some(secs) = lookup("AUTHZ_DELEGATION_RETENTION_SECS") {
            config.delegation.retention_secs = secs.trim().parse().map_err(|_| {
                AuthzError::Config(format!("AUTHZ_DELEGATION_RETENTION_SECS must be an integer, got '{}'", secs))
            })?;
        }

        Ok(config)
    }
}
