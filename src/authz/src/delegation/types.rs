//! Delegation records and grant requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::pattern;

/// Lifecycle state of a delegation
///
/// `Revoked` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegationState {
    Active,
    Revoked,
    Expired,
}

impl DelegationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DelegationState::Active)
    }
}

impl fmt::Display for DelegationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelegationState::Active => write!(f, "active"),
            DelegationState::Revoked => write!(f, "revoked"),
            DelegationState::Expired => write!(f, "expired"),
        }
    }
}

/// Resources and actions handed over by a delegation
///
/// Entries are wildcard patterns; `"*"` stands for everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationScope {
    pub resources: Vec<String>,
    pub actions: Vec<String>,
    /// Restrict the delegation to a single domain
    #[serde(default)]
    pub domain: Option<String>,
}

impl DelegationScope {
    pub fn new<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
            domain: None,
        }
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// True when there is nothing to delegate
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() || self.actions.is_empty()
    }

    /// Every (resource, action) combination in the scope
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.resources
            .iter()
            .flat_map(move |r| self.actions.iter().map(move |a| (r.as_str(), a.as_str())))
    }

    /// Whether a request falls inside this scope
    ///
    /// A scope without a domain covers requests in any domain.
    pub fn covers(&self, resource_id: &str, action: &str, domain: Option<&str>) -> bool {
        let domain_ok = match (&self.domain, domain) {
            (None, _) => true,
            (Some(scoped), Some(requested)) => scoped == requested,
            (Some(_), None) => false,
        };

        domain_ok
            && self.resources.iter().any(|p| pattern::matches_pattern(p, resource_id))
            && self.actions.iter().any(|p| pattern::matches_pattern(p, action))
    }
}

/// A persisted grant of permissions from one subject to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub id: String,
    pub delegator_id: String,
    pub delegate_id: String,
    pub scope: DelegationScope,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Whether the delegate may pass the scope on
    pub is_transitive: bool,
    pub state: DelegationState,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Delegation {
    /// Active state and not yet past its expiry
    ///
    /// Expiry is applied lazily: a record whose `expires_at` has passed is
    /// inactive even while its stored state still reads `Active`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state == DelegationState::Active
            && self.revoked_at.is_none()
            && self.expires_at.map_or(true, |expires| expires > now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// When the delegation entered its terminal state, if it has
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            DelegationState::Active => None,
            DelegationState::Revoked => self.revoked_at,
            DelegationState::Expired => self.expires_at.or(Some(self.created_at)),
        }
    }

    pub fn covers(&self, resource_id: &str, action: &str, domain: Option<&str>) -> bool {
        self.scope.covers(resource_id, action, domain)
    }
}

/// Everything a delegator specifies when granting
#[derive(Debug, Clone, Default)]
pub struct DelegationGrant {
    pub scope: DelegationScope,
    pub expires_at: Option<DateTime<Utc>>,
    pub transitive: bool,
    pub metadata: HashMap<String, Value>,
}

impl DelegationGrant {
    pub fn new<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            scope: DelegationScope::new(resources, actions),
            ..Default::default()
        }
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.scope.domain = Some(domain.into());
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
