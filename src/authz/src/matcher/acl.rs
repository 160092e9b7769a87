//! Access-control-list matching

use super::{target_matches, RuleMatcher};
use crate::pattern;
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Matches subject, resource and action with wildcard patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct AclMatcher;

impl AclMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl RuleMatcher for AclMatcher {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool {
        pattern::matches_pattern(rule.subject(), &subject.id)
            && target_matches(rule, resource, action, domain)
    }

    fn name(&self) -> &str {
        "acl"
    }
}
