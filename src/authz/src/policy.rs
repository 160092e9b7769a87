//! Policy rules and the policy repository contract

use crate::error::{AuthzError, Result};
use crate::expression::ExpressionEngine;
use crate::pattern;
use crate::types::{Domain, Resource, Subject};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Rule effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

impl Effect {
    pub fn is_allow(&self) -> bool {
        matches!(self, Effect::Allow)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("allow") {
            Ok(Effect::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(Effect::Deny)
        } else {
            Err(AuthzError::InvalidPolicy(format!("unknown effect '{}'", s)))
        }
    }
}

/// Rule priority (higher ranks first under the priority resolver)
///
/// The named bands are presets; any integer is a valid priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(900);
    pub const HIGH: Priority = Priority(700);
    pub const NORMAL: Priority = Priority(500);
    pub const LOW: Priority = Priority(300);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

/// A single declarative authorization rule
///
/// Rules are immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRule {
    subject: String,
    resource: Option<String>,
    action: String,
    effect: Effect,
    priority: Priority,
    domain: Option<Domain>,
    conditions: HashMap<String, Value>,
    metadata: HashMap<String, Value>,
}

impl PolicyRule {
    /// Create a rule for a resource pattern
    ///
    /// # Arguments
    ///
    /// * `subject` - Subject pattern, `role:` token or attribute expression
    /// * `resource` - Resource pattern or path template
    /// * `action` - Action pattern or HTTP method
    /// * `effect` - Effect when the rule matches
    pub fn new(
        subject: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: Effect,
    ) -> Self {
        Self::build(subject.into(), Some(resource.into()), action.into(), effect)
    }

    /// Create a rule that applies regardless of the resource
    pub fn for_any_resource(subject: impl Into<String>, action: impl Into<String>, effect: Effect) -> Self {
        Self::build(subject.into(), None, action.into(), effect)
    }

    /// Shorthand for an `Allow` rule
    pub fn allow(subject: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(subject, resource, action, Effect::Allow)
    }

    /// Shorthand for a `Deny` rule
    pub fn deny(subject: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(subject, resource, action, Effect::Deny)
    }

    fn build(subject: String, resource: Option<String>, action: String, effect: Effect) -> Self {
        Self {
            subject,
            resource,
            action,
            effect,
            priority: Priority::default(),
            domain: None,
            conditions: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Restrict the rule to a single domain
    pub fn in_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Require an attribute path (e.g. `resource.status`) to equal a value
    pub fn with_condition(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(path.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Resource pattern; `None` matches regardless of resource
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    pub fn conditions(&self) -> &HashMap<String, Value> {
        &self.conditions
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Whether the rule's domain constraint accepts the query domain.
    ///
    /// A rule without a domain applies in every domain (and outside of any).
    pub fn matches_domain(&self, domain: Option<&Domain>) -> bool {
        match (&self.domain, domain) {
            (None, _) => true,
            (Some(rule_domain), Some(query)) => rule_domain.id == query.id,
            (Some(_), None) => false,
        }
    }

    /// Whether the subject field reads as an attribute expression rather
    /// than an identifier pattern
    pub fn has_expression_subject(&self) -> bool {
        let s = self.subject.trim_start();
        ["subject.", "resource.", "domain."].iter().any(|root| s.starts_with(root))
            || ["==", "!=", "<", ">", "&&", "||", "("].iter().any(|op| s.contains(op))
    }
}

/// Flat rule record as exchanged with policy storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub subject: String,

    #[serde(default)]
    pub resource: Option<String>,

    pub action: String,

    /// "Allow" or "Deny" (case-insensitive)
    pub effect: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub conditions: Option<HashMap<String, Value>>,

    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TryFrom<PolicyRecord> for PolicyRule {
    type Error = AuthzError;

    fn try_from(record: PolicyRecord) -> Result<Self> {
        if record.subject.trim().is_empty() {
            return Err(AuthzError::InvalidPolicy("rule subject cannot be empty".to_string()));
        }
        if record.action.trim().is_empty() {
            return Err(AuthzError::InvalidPolicy("rule action cannot be empty".to_string()));
        }

        let effect = record.effect.parse::<Effect>()?;

        Ok(PolicyRule {
            subject: record.subject,
            resource: record.resource,
            action: record.action,
            effect,
            priority: record.priority,
            domain: record.domain.map(Domain::new),
            conditions: record.conditions.unwrap_or_default(),
            metadata: record.metadata.unwrap_or_default(),
        })
    }
}

impl From<&PolicyRule> for PolicyRecord {
    fn from(rule: &PolicyRule) -> Self {
        Self {
            subject: rule.subject.clone(),
            resource: rule.resource.clone(),
            action: rule.action.clone(),
            effect: rule.effect.to_string(),
            priority: rule.priority,
            domain: rule.domain.as_ref().map(|d| d.id.clone()),
            conditions: (!rule.conditions.is_empty()).then(|| rule.conditions.clone()),
            metadata: (!rule.metadata.is_empty()).then(|| rule.metadata.clone()),
        }
    }
}

/// Ordered collection of rules
///
/// Insertion order is preserved and rules are never dropped; evaluation
/// never mutates a policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    rules: Vec<PolicyRule>,
}

impl Policy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a policy from flat storage records, failing on the first invalid one
    pub fn from_records(records: Vec<PolicyRecord>) -> Result<Self> {
        let rules = records
            .into_iter()
            .map(PolicyRule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolicyRule> {
        self.rules.iter()
    }

    /// Parse every attribute expression in the policy up front.
    ///
    /// Checks expression subjects and condition paths so that malformed rules
    /// can be rejected at load time instead of being skipped at evaluation.
    pub fn validate_expressions(&self, engine: &ExpressionEngine) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.has_expression_subject() {
                engine.compile(&rule.subject).map_err(|e| {
                    AuthzError::InvalidPolicy(format!("rule {}: {}", index, e))
                })?;
            }
            for path in rule.conditions.keys() {
                engine.compile(path).map_err(|e| {
                    AuthzError::InvalidPolicy(format!("rule {} condition '{}': {}", index, path, e))
                })?;
            }
        }
        Ok(())
    }
}

impl From<Vec<PolicyRule>> for Policy {
    fn from(rules: Vec<PolicyRule>) -> Self {
        Self::new(rules)
    }
}

impl<'a> IntoIterator for &'a Policy {
    type Item = &'a PolicyRule;
    type IntoIter = std::slice::Iter<'a, PolicyRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Policy repository trait
///
/// Storage backends implement this to supply the rules relevant to a
/// subject/resource pair. Pre-filtering is optional; the matcher has the
/// final say.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Get all rules potentially relevant to this subject and resource
    async fn get_policies_for(&self, subject: &Subject, resource: &Resource) -> Result<Policy>;
}

/// In-memory policy repository implementation
#[derive(Default)]
pub struct InMemoryPolicyRepository {
    rules: Arc<RwLock<Vec<PolicyRule>>>,
}

impl InMemoryPolicyRepository {
    /// Create a new in-memory policy repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with rules
    pub fn with_rules(rules: Vec<PolicyRule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(rules)),
        }
    }

    /// Append a rule
    pub async fn add_rule(&self, rule: PolicyRule) {
        self.rules.write().await.push(rule);
    }

    /// Append flat storage records; nothing is stored if any record is invalid
    pub async fn add_records(&self, records: Vec<PolicyRecord>) -> Result<()> {
        let policy = Policy::from_records(records)?;
        self.rules.write().await.extend(policy.rules);
        Ok(())
    }

    /// Remove every rule
    pub async fn clear(&self) {
        self.rules.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    /// Conservative pre-filter: only plain patterns that cannot match the
    /// resource are dropped. Path templates are left to the matcher.
    fn might_apply(rule: &PolicyRule, resource: &Resource) -> bool {
        match rule.resource() {
            None => true,
            Some(template) if template.contains('/') => true,
            Some(pattern) => pattern::matches_pattern(pattern, &resource.id),
        }
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn get_policies_for(&self, subject: &Subject, resource: &Resource) -> Result<Policy> {
        let rules = self.rules.read().await;
        let relevant: Vec<PolicyRule> = rules
            .iter()
            .filter(|rule| Self::might_apply(rule, resource))
            .cloned()
            .collect();

        debug!(
            "Loaded {} of {} rules for subject={} resource={}",
            relevant.len(),
            rules.len(),
            subject.id,
            resource.id
        );

        Ok(Policy::new(relevant))
    }
}
