//! Conflict resolution between matched rules

use crate::policy::{Effect, PolicyRule};

/// Reduces the rules that matched a request to a single effect
///
/// `matched` is given in policy order. Every implementation must return
/// `Deny` for an empty slice.
pub trait EffectResolver: Send + Sync {
    fn resolve(&self, matched: &[&PolicyRule]) -> Effect;

    /// Index into `matched` of the rule that determined the outcome, if any
    fn deciding_rule(&self, matched: &[&PolicyRule]) -> Option<usize>;

    fn name(&self) -> &str;
}

/// Deny-override resolution
///
/// Any matching `Deny` wins regardless of priority, then any `Allow`,
/// otherwise implicit deny.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResolver;

impl EffectResolver for StandardResolver {
    fn resolve(&self, matched: &[&PolicyRule]) -> Effect {
        if matched.iter().any(|r| r.effect() == Effect::Deny) {
            Effect::Deny
        } else if matched.iter().any(|r| r.effect() == Effect::Allow) {
            Effect::Allow
        } else {
            Effect::Deny
        }
    }

    fn deciding_rule(&self, matched: &[&PolicyRule]) -> Option<usize> {
        matched
            .iter()
            .position(|r| r.effect() == Effect::Deny)
            .or_else(|| matched.iter().position(|r| r.effect() == Effect::Allow))
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// First-applicable resolution by rank
///
/// The highest priority rule decides; ties go to the rule listed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityResolver;

impl EffectResolver for PriorityResolver {
    fn resolve(&self, matched: &[&PolicyRule]) -> Effect {
        self.deciding_rule(matched)
            .map(|i| matched[i].effect())
            .unwrap_or(Effect::Deny)
    }

    fn deciding_rule(&self, matched: &[&PolicyRule]) -> Option<usize> {
        // max_by_key keeps the last maximum, so compare against reversed index
        matched
            .iter()
            .enumerate()
            .max_by_key(|(i, r)| (r.priority(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
    }

    fn name(&self) -> &str {
        "priority"
    }
}
