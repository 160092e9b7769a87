//! Policy evaluation
//!
//! Filters a policy's rules through the configured matcher and reduces the
//! survivors to one effect with the configured resolver.
//!
//! ```text
//! Policy ─→ RuleMatcher (+ rule conditions) ─→ matched rules ─→ EffectResolver ─→ Effect
//! ```
//!
//! Evaluation is synchronous, performs no I/O and never mutates its inputs,
//! so a single evaluator can be shared across any number of tasks.

pub mod decision;

pub use decision::Decision;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AuthorizationModel, EvaluatorConfig, ResolutionStrategy};
use crate::expression::ast::{CompareOp, Expr, Operand};
use crate::expression::eval::compare;
use crate::expression::{EvalContext, ExpressionEngine};
use crate::matcher::{AbacMatcher, AclMatcher, CompositeMatcher, RbacMatcher, RestfulMatcher, RuleMatcher};
use crate::policy::{Effect, Policy, PolicyRule};
use crate::resolver::{EffectResolver, PriorityResolver, StandardResolver};
use crate::types::{Action, Domain, Resource, Subject};

/// Single entry point for authorization decisions
#[derive(Clone)]
pub struct PolicyEvaluator {
    matcher: Arc<dyn RuleMatcher>,
    resolver: Arc<dyn EffectResolver>,
    /// Shared with the ABAC matcher; also compiles rule condition paths
    expressions: Arc<ExpressionEngine>,
}

impl PolicyEvaluator {
    /// Create an evaluator from an explicit matcher and resolver
    pub fn new(matcher: Arc<dyn RuleMatcher>, resolver: Arc<dyn EffectResolver>) -> Self {
        Self {
            matcher,
            resolver,
            expressions: Arc::new(ExpressionEngine::new()),
        }
    }

    /// Create an evaluator for the configured model and strategy
    pub fn from_config(config: &EvaluatorConfig) -> Self {
        let expressions = Arc::new(ExpressionEngine::new());
        let matcher = build_matcher(&config.model, &expressions);
        let resolver: Arc<dyn EffectResolver> = match config.strategy {
            ResolutionStrategy::Standard => Arc::new(StandardResolver),
            ResolutionStrategy::Priority => Arc::new(PriorityResolver),
        };

        debug!(
            "PolicyEvaluator initialized with matcher={}, resolver={}",
            matcher.name(),
            resolver.name()
        );

        Self {
            matcher,
            resolver,
            expressions,
        }
    }

    /// Shorthand for an RBAC evaluator with deny-override resolution
    pub fn rbac() -> Self {
        Self::from_config(&EvaluatorConfig::default())
    }

    pub fn matcher(&self) -> &Arc<dyn RuleMatcher> {
        &self.matcher
    }

    pub fn resolver(&self) -> &Arc<dyn EffectResolver> {
        &self.resolver
    }

    /// Decide Allow or Deny for a request
    pub fn evaluate(
        &self,
        policy: &Policy,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Effect {
        self.explain(policy, subject, resource, action, domain).effect
    }

    /// Evaluate and report which rules matched and which one decided
    pub fn explain(
        &self,
        policy: &Policy,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Decision {
        let ctx = EvalContext::new(subject, resource, domain);

        let (indices, matched): (Vec<usize>, Vec<&PolicyRule>) = policy
            .iter()
            .enumerate()
            .filter(|(_, rule)| {
                self.matcher.matches(rule, subject, resource, action, domain)
                    && self.conditions_hold(rule, &ctx)
            })
            .unzip();

        let effect = self.resolver.resolve(&matched);
        let deciding_rule = self.resolver.deciding_rule(&matched).map(|i| indices[i]);

        let reason = match deciding_rule {
            Some(index) => format!(
                "Rule {} ({} {} on {}) decided {} via {} resolution",
                index,
                policy.rules()[index].subject(),
                policy.rules()[index].action(),
                policy.rules()[index].resource().unwrap_or("any resource"),
                effect,
                self.resolver.name()
            ),
            None => "No rule matched, default deny".to_string(),
        };

        debug!(
            "Evaluated subject={} resource={} action={} domain={:?}: {} ({} of {} rules matched)",
            subject.id,
            resource.id,
            action.name,
            domain.map(|d| d.id.as_str()),
            effect,
            indices.len(),
            policy.len()
        );

        Decision {
            effect,
            matched_rules: indices,
            deciding_rule,
            reason,
        }
    }

    /// Every condition path must resolve to a value equal to the expected one
    fn conditions_hold(&self, rule: &PolicyRule, ctx: &EvalContext<'_>) -> bool {
        rule.conditions().iter().all(|(key, expected)| {
            let expression = match self.expressions.compile(key) {
                Ok(expression) => expression,
                Err(e) => {
                    warn!("Skipping rule with malformed condition path '{}': {}", key, e);
                    return false;
                }
            };

            match expression.ast() {
                Expr::Operand(Operand::Path(path)) => {
                    let actual = ctx.resolve(path);
                    let expected = (!expected.is_null()).then_some(expected);
                    compare(CompareOp::Eq, actual.as_deref(), expected)
                }
                _ => {
                    warn!("Skipping rule whose condition key '{}' is not an attribute path", key);
                    false
                }
            }
        })
    }
}

impl std::fmt::Debug for PolicyEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEvaluator")
            .field("matcher", &self.matcher.name())
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

fn build_matcher(model: &AuthorizationModel, expressions: &Arc<ExpressionEngine>) -> Arc<dyn RuleMatcher> {
    match model {
        AuthorizationModel::Acl => Arc::new(AclMatcher::new()),
        AuthorizationModel::Rbac => Arc::new(RbacMatcher::new()),
        AuthorizationModel::Abac => Arc::new(AbacMatcher::with_engine(expressions.clone())),
        AuthorizationModel::Restful => Arc::new(RestfulMatcher::new()),
        AuthorizationModel::Composite(models) => Arc::new(CompositeMatcher::new(
            models.iter().map(|m| build_matcher(m, expressions)).collect(),
        )),
    }
}
