//! Role-based matching

use super::{target_matches, RuleMatcher};
use crate::pattern;
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Prefix marking a rule subject as a role token
pub const ROLE_PREFIX: &str = "role:";

/// Matches `role:<name>` subjects against the subject's roles
///
/// Role membership is exact (no globbing). Roles are read from the `roles`
/// attribute and, when the request carries a domain, from
/// `domain_roles[<domain id>]`. Entries may be written with or without the
/// `role:` prefix. Subjects that are not role tokens fall back to ACL
/// matching on the subject id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacMatcher;

impl RbacMatcher {
    pub fn new() -> Self {
        Self
    }

    fn has_role(subject: &Subject, role: &str, domain: Option<&Domain>) -> bool {
        let held = |entry: &&str| {
            *entry == role || entry.strip_prefix(ROLE_PREFIX) == Some(role)
        };

        if subject.roles().iter().any(held) {
            return true;
        }

        domain.map_or(false, |d| subject.domain_roles(&d.id).iter().any(held))
    }
}

impl RuleMatcher for RbacMatcher {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool {
        let subject_matches = match rule.subject().strip_prefix(ROLE_PREFIX) {
            Some(role) => Self::has_role(subject, role, domain),
            None => pattern::matches_pattern(rule.subject(), &subject.id),
        };

        subject_matches && target_matches(rule, resource, action, domain)
    }

    fn name(&self) -> &str {
        "rbac"
    }
}
