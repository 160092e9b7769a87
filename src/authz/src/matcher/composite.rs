//! Composite matching across several authorization models

use std::sync::Arc;

use super::RuleMatcher;
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Accepts a rule if any of its matchers accepts it
///
/// Effect, priority and domain always come from the rule itself, whichever
/// matcher accepted it.
#[derive(Clone, Default)]
pub struct CompositeMatcher {
    matchers: Vec<Arc<dyn RuleMatcher>>,
}

impl CompositeMatcher {
    pub fn new(matchers: Vec<Arc<dyn RuleMatcher>>) -> Self {
        Self { matchers }
    }

    /// Append a matcher
    pub fn with(mut self, matcher: impl RuleMatcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl RuleMatcher for CompositeMatcher {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool {
        self.matchers
            .iter()
            .any(|m| m.matches(rule, subject, resource, action, domain))
    }

    fn name(&self) -> &str {
        "composite"
    }
}

impl std::fmt::Debug for CompositeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.matchers.iter().map(|m| m.name()).collect();
        f.debug_struct("CompositeMatcher").field("matchers", &names).finish()
    }
}
