//! Evaluation outcome with the rules that produced it

use serde::{Deserialize, Serialize};

use crate::policy::Effect;

/// Result of evaluating a policy for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Final effect
    pub effect: Effect,

    /// Indices (into the policy) of every rule that matched, in policy order
    pub matched_rules: Vec<usize>,

    /// Index (into the policy) of the rule that determined the effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deciding_rule: Option<usize>,

    /// Human readable explanation
    pub reason: String,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// True when no rule matched and the effect is the default deny
    pub fn is_implicit_deny(&self) -> bool {
        self.effect == Effect::Deny && self.matched_rules.is_empty()
    }
}
