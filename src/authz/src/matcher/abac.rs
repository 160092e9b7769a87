//! Attribute-based matching

use std::sync::Arc;
use tracing::{debug, warn};

use super::{target_matches, RuleMatcher};
use crate::expression::{EvalContext, ExpressionEngine};
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Interprets the rule subject as an attribute expression
///
/// Expressions are compiled once per distinct text through the shared
/// [`ExpressionEngine`]. A rule whose expression fails to parse is skipped
/// (logged), never fatal to the evaluation.
#[derive(Debug, Clone, Default)]
pub struct AbacMatcher {
    engine: Arc<ExpressionEngine>,
}

impl AbacMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing engine (and its compiled expression cache)
    pub fn with_engine(engine: Arc<ExpressionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ExpressionEngine> {
        &self.engine
    }
}

impl RuleMatcher for AbacMatcher {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool {
        // Cheap checks first so the expression only runs for candidate rules
        if !target_matches(rule, resource, action, domain) {
            return false;
        }

        if !rule.has_expression_subject() {
            debug!("Rule subject '{}' is not an attribute expression", rule.subject());
            return false;
        }

        let expression = match self.engine.compile(rule.subject()) {
            Ok(expression) => expression,
            Err(e) => {
                warn!("Skipping rule with malformed expression '{}': {}", rule.subject(), e);
                return false;
            }
        };

        expression.evaluate(&EvalContext::new(subject, resource, domain))
    }

    fn name(&self) -> &str {
        "abac"
    }
}
