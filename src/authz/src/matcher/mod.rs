//! Rule matchers for each authorization model
//!
//! A matcher decides whether a single rule applies to a request. Every model
//! implements [`RuleMatcher`]; [`CompositeMatcher`] combines several of them
//! with OR semantics.
//!
//! | Matcher   | Subject                          | Resource           | Action            |
//! |-----------|----------------------------------|--------------------|-------------------|
//! | ACL       | wildcard pattern on `subject.id` | wildcard pattern   | wildcard pattern  |
//! | RBAC      | `role:` token in roles, else ACL | wildcard pattern   | wildcard pattern  |
//! | ABAC      | attribute expression             | wildcard pattern   | wildcard pattern  |
//! | RESTful   | wildcard pattern on `subject.id` | path template      | exact HTTP method |

pub mod abac;
pub mod acl;
pub mod composite;
pub mod rbac;
pub mod restful;

pub use abac::AbacMatcher;
pub use acl::AclMatcher;
pub use composite::CompositeMatcher;
pub use rbac::RbacMatcher;
pub use restful::RestfulMatcher;

use crate::pattern;
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Decides whether a rule applies to a request
///
/// Implementations must be pure: no I/O and no observable state changes, so
/// one matcher can serve any number of concurrent evaluations.
pub trait RuleMatcher: Send + Sync {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool;

    /// Short model name used in logs
    fn name(&self) -> &str;
}

/// Resource, action and domain checks shared by the ACL, RBAC and ABAC models
pub(crate) fn target_matches(
    rule: &PolicyRule,
    resource: &Resource,
    action: &Action,
    domain: Option<&Domain>,
) -> bool {
    pattern::matches(rule.resource(), &resource.id)
        && pattern::matches_pattern(rule.action(), &action.name)
        && rule.matches_domain(domain)
}
