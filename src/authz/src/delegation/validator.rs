//! Delegation grant validation
//!
//! A grant is accepted only when it cannot be used to escalate privileges:
//!
//! 1. The scope names at least one resource and one action.
//! 2. The new edge does not close a loop in the delegation graph. The walk
//!    follows active transitive delegations upward from the delegator,
//!    breadth first, for at most `max_chain_depth` hops.
//! 3. The delegator holds every (resource, action) pair, either through its
//!    own policy or through a transitive delegation it received.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::ValidationError;
use super::repository::DelegationRepository;
use super::types::{Delegation, DelegationScope};
use crate::config::DelegationConfig;
use crate::engine::PolicyEvaluator;
use crate::error::{AuthzError, Result};
use crate::pattern;
use crate::policy::{Effect, PolicyRepository};
use crate::types::{Action, Domain, Resource, Subject};

/// Authorizes delegation grants against policy and existing delegations
#[derive(Clone)]
pub struct DelegationValidator {
    policies: Arc<dyn PolicyRepository>,
    delegations: Arc<dyn DelegationRepository>,
    evaluator: Arc<PolicyEvaluator>,
    max_chain_depth: usize,
}

impl DelegationValidator {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        delegations: Arc<dyn DelegationRepository>,
        evaluator: Arc<PolicyEvaluator>,
        config: &DelegationConfig,
    ) -> Self {
        Self {
            policies,
            delegations,
            evaluator,
            max_chain_depth: config.max_chain_depth,
        }
    }

    /// Check that `delegator` may hand `scope` to `delegate_id`
    ///
    /// # Errors
    /// `DelegationValidationFailed` when the grant is rejected; repository
    /// failures propagate as they are.
    pub async fn validate(
        &self,
        delegator: &Subject,
        delegate_id: &str,
        scope: &DelegationScope,
        is_transitive: bool,
    ) -> Result<()> {
        debug!(
            "Validating delegation {} -> {} (transitive={}, {} resources, {} actions)",
            delegator.id,
            delegate_id,
            is_transitive,
            scope.resources.len(),
            scope.actions.len()
        );

        if scope.is_empty() {
            return Err(ValidationError::EmptyScope.into());
        }

        if delegator.id != delegate_id {
            self.check_cycle(&delegator.id, delegate_id).await?;
        }

        self.check_permissions(delegator, scope).await
    }

    /// Breadth-first walk from the delegator to whoever transitively
    /// delegated to it
    async fn check_cycle(&self, delegator_id: &str, delegate_id: &str) -> Result<()> {
        let mut visited: HashSet<String> = HashSet::from([delegator_id.to_string()]);
        // child -> the subject it was reached from, for reporting the loop
        let mut reached_from: HashMap<String, String> = HashMap::new();
        let mut frontier: VecDeque<String> = VecDeque::from([delegator_id.to_string()]);
        let mut hops = 0;

        while !frontier.is_empty() {
            let mut next = VecDeque::new();

            while let Some(current) = frontier.pop_front() {
                let received = self.delegations.find_active_for_delegate(&current).await?;
                for received in received.into_iter().filter(|d| d.is_transitive) {
                    let upstream = received.delegator_id;

                    if upstream == delegate_id {
                        let chain = loop_chain(&reached_from, &current, delegate_id);
                        warn!("Rejected cyclical delegation: {}", chain.join(" -> "));
                        return Err(ValidationError::CyclicalDelegation { chain }.into());
                    }

                    if visited.insert(upstream.clone()) {
                        reached_from.insert(upstream.clone(), current.clone());
                        next.push_back(upstream);
                    }
                }
            }

            if next.is_empty() {
                break;
            }

            hops += 1;
            if hops > self.max_chain_depth {
                warn!(
                    "Delegation chain above {} exceeds {} hops",
                    delegator_id, self.max_chain_depth
                );
                return Err(ValidationError::ChainDepthExceeded {
                    limit: self.max_chain_depth,
                }
                .into());
            }

            frontier = next;
        }

        Ok(())
    }

    async fn check_permissions(&self, delegator: &Subject, scope: &DelegationScope) -> Result<()> {
        let domain = scope.domain.as_deref().map(Domain::new);
        // Loaded on the first pair the delegator's own policy denies
        let mut received: Option<Vec<Delegation>> = None;

        for (resource_pattern, action_name) in scope.pairs() {
            if resource_pattern == pattern::WILDCARD || action_name == pattern::WILDCARD {
                debug!(
                    "Skipping verification of universal pair ({}, {})",
                    resource_pattern, action_name
                );
                continue;
            }

            let resource = Resource::new(resource_pattern);
            let action = Action::new(action_name);
            let policy = self.policies.get_policies_for(delegator, &resource).await?;

            let effect = self
                .evaluator
                .evaluate(&policy, delegator, &resource, &action, domain.as_ref());
            if effect == Effect::Allow {
                continue;
            }

            if received.is_none() {
                received = Some(self.delegations.find_active_for_delegate(&delegator.id).await?);
            }
            let held_transitively = received.iter().flatten().any(|d| {
                d.is_transitive && d.covers(resource_pattern, action_name, scope.domain.as_deref())
            });

            if !held_transitively {
                warn!(
                    "Rejected delegation from {}: '{}' on '{}' not held",
                    delegator.id, action_name, resource_pattern
                );
                return Err(AuthzError::DelegationValidationFailed(
                    ValidationError::PermissionNotHeld {
                        resource: resource_pattern.to_string(),
                        action: action_name.to_string(),
                    },
                ));
            }
        }

        Ok(())
    }
}

/// The loop closed by the new grant, from the delegate back to itself
fn loop_chain(reached_from: &HashMap<String, String>, last: &str, delegate_id: &str) -> Vec<String> {
    let mut chain = vec![delegate_id.to_string(), last.to_string()];
    let mut current = last;

    while let Some(child) = reached_from.get(current) {
        chain.push(child.clone());
        current = child;
    }

    chain.push(delegate_id.to_string());
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::repository::InMemoryDelegationRepository;
    use crate::delegation::types::DelegationState;
    use crate::policy::{InMemoryPolicyRepository, PolicyRule};
    use chrono::Utc;

    fn edge(id: &str, from: &str, to: &str) -> Delegation {
        Delegation {
            id: id.to_string(),
            delegator_id: from.to_string(),
            delegate_id: to.to_string(),
            scope: DelegationScope::new(["*"], ["*"]),
            created_at: Utc::now(),
            expires_at: None,
            revoked_at: None,
            is_transitive: true,
            state: DelegationState::Active,
            metadata: HashMap::new(),
        }
    }

    fn validator(
        rules: Vec<PolicyRule>,
        delegations: Arc<InMemoryDelegationRepository>,
        max_chain_depth: usize,
    ) -> DelegationValidator {
        DelegationValidator::new(
            Arc::new(InMemoryPolicyRepository::with_rules(rules)),
            delegations,
            Arc::new(PolicyEvaluator::rbac()),
            &DelegationConfig {
                max_chain_depth,
                ..Default::default()
            },
        )
    }

    fn rejection(result: Result<()>) -> ValidationError {
        match result {
            Err(AuthzError::DelegationValidationFailed(e)) => e,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_scope() {
        let v = validator(vec![], Arc::new(InMemoryDelegationRepository::new()), 10);
        let scope = DelegationScope::new(["document:1"], Vec::<String>::new());

        let err = rejection(v.validate(&Subject::new("alice"), "bob", &scope, false).await);
        assert_eq!(err, ValidationError::EmptyScope);
    }

    #[tokio::test]
    async fn test_loop_chain_reported_from_delegate() {
        // carol -> alice -> bob already exist; bob granting carol closes the loop
        let repo = Arc::new(InMemoryDelegationRepository::new());
        repo.create(edge("d1", "carol", "alice")).await.unwrap();
        repo.create(edge("d2", "alice", "bob")).await.unwrap();

        let v = validator(vec![], repo, 10);
        let err = rejection(
            v.validate(&Subject::new("bob"), "carol", &DelegationScope::new(["*"], ["*"]), false)
                .await,
        );

        assert_eq!(
            err,
            ValidationError::CyclicalDelegation {
                chain: vec!["carol", "alice", "bob", "carol"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            }
        );
    }

    #[tokio::test]
    async fn test_chain_depth_limit() {
        // u3 -> u2 -> u1 -> u0
        let repo = Arc::new(InMemoryDelegationRepository::new());
        repo.create(edge("d1", "u1", "u0")).await.unwrap();
        repo.create(edge("d2", "u2", "u1")).await.unwrap();
        repo.create(edge("d3", "u3", "u2")).await.unwrap();
        let scope = DelegationScope::new(["*"], ["*"]);

        let shallow = validator(vec![], repo.clone(), 2);
        let err = rejection(shallow.validate(&Subject::new("u0"), "x", &scope, false).await);
        assert_eq!(err, ValidationError::ChainDepthExceeded { limit: 2 });

        let deep_enough = validator(vec![], repo, 3);
        assert!(deep_enough.validate(&Subject::new("u0"), "x", &scope, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_self_grant_skips_cycle_walk() {
        let repo = Arc::new(InMemoryDelegationRepository::new());
        repo.create(edge("d1", "bob", "alice")).await.unwrap();
        repo.create(edge("d2", "alice", "bob")).await.unwrap();

        let v = validator(vec![PolicyRule::allow("alice", "document:*", "read")], repo, 10);
        let scope = DelegationScope::new(["document:1"], ["read"]);
        assert!(v.validate(&Subject::new("alice"), "alice", &scope, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_received_transitive_delegation_counts() {
        let repo = Arc::new(InMemoryDelegationRepository::new());
        let mut transitive = edge("d1", "alice", "bob");
        transitive.scope = DelegationScope::new(["document:*"], ["read"]);
        let mut plain = edge("d2", "alice", "bob");
        plain.scope = DelegationScope::new(["report:*"], ["read"]);
        plain.is_transitive = false;
        repo.create(transitive).await.unwrap();
        repo.create(plain).await.unwrap();

        let v = validator(vec![], repo, 10);
        let bob = Subject::new("bob");

        assert!(v
            .validate(&bob, "carol", &DelegationScope::new(["document:7"], ["read"]), false)
            .await
            .is_ok());

        let err = rejection(
            v.validate(&bob, "carol", &DelegationScope::new(["report:7"], ["read"]), false)
                .await,
        );
        assert_eq!(
            err,
            ValidationError::PermissionNotHeld {
                resource: "report:7".to_string(),
                action: "read".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_transitive_edges_do_not_form_loops() {
        // bob -> alice cannot be passed on, so alice granting bob closes nothing
        let repo = Arc::new(InMemoryDelegationRepository::new());
        let mut plain = edge("d1", "bob", "alice");
        plain.is_transitive = false;
        repo.create(plain).await.unwrap();

        let v = validator(vec![PolicyRule::allow("alice", "report:*", "read")], repo.clone(), 10);
        let scope = DelegationScope::new(["report:2"], ["read"]);
        assert!(v.validate(&Subject::new("alice"), "bob", &scope, false).await.is_ok());

        repo.create(edge("d2", "bob", "alice")).await.unwrap();
        let err = rejection(v.validate(&Subject::new("alice"), "bob", &scope, false).await);
        assert!(matches!(err, ValidationError::CyclicalDelegation { .. }));
    }

    #[tokio::test]
    async fn test_domain_scoped_permission() {
        let rules = vec![PolicyRule::allow("role:admin", "tenant:*", "manage").in_domain(Domain::new("acme"))];
        let v = validator(rules, Arc::new(InMemoryDelegationRepository::new()), 10);
        let admin = Subject::new("alice").with_roles(["admin"]);

        let in_acme = DelegationScope::new(["tenant:settings"], ["manage"]).in_domain("acme");
        assert!(v.validate(&admin, "bob", &in_acme, false).await.is_ok());

        let in_globex = DelegationScope::new(["tenant:settings"], ["manage"]).in_domain("globex");
        assert!(v.validate(&admin, "bob", &in_globex, false).await.is_err());
    }
}
