//! Delegation lifecycle management

use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::repository::DelegationRepository;
use super::types::{Delegation, DelegationGrant, DelegationScope, DelegationState};
use super::validator::DelegationValidator;
use crate::config::DelegationConfig;
use crate::engine::PolicyEvaluator;
use crate::error::{AuthzError, Result};
use crate::policy::{Effect, PolicyRepository};
use crate::types::{Action, Domain, Resource, Subject};

/// Public entry point for granting, revoking and querying delegations
pub struct DelegationManager {
    delegations: Arc<dyn DelegationRepository>,
    policies: Arc<dyn PolicyRepository>,
    evaluator: Arc<PolicyEvaluator>,
    validator: DelegationValidator,
    max_chain_depth: usize,
}

impl DelegationManager {
    pub fn new(
        delegations: Arc<dyn DelegationRepository>,
        policies: Arc<dyn PolicyRepository>,
        evaluator: Arc<PolicyEvaluator>,
        config: &DelegationConfig,
    ) -> Self {
        let validator = DelegationValidator::new(
            policies.clone(),
            delegations.clone(),
            evaluator.clone(),
            config,
        );

        info!(
            "DelegationManager initialized (max_chain_depth={})",
            config.max_chain_depth
        );

        Self {
            delegations,
            policies,
            evaluator,
            validator,
            max_chain_depth: config.max_chain_depth,
        }
    }

    pub fn validator(&self) -> &DelegationValidator {
        &self.validator
    }

    /// Grant part of `delegator`'s permissions to `delegate_id`
    ///
    /// # Errors
    /// `DelegationValidationFailed` if the delegator does not hold the scope or
    /// the grant would create a cycle. Nothing is persisted in that case.
    pub async fn grant(
        &self,
        delegator: &Subject,
        delegate_id: &str,
        grant: DelegationGrant,
    ) -> Result<Delegation> {
        self.validator
            .validate(delegator, delegate_id, &grant.scope, grant.transitive)
            .await?;

        let delegation = Delegation {
            id: Uuid::new_v4().to_string(),
            delegator_id: delegator.id.clone(),
            delegate_id: delegate_id.to_string(),
            scope: grant.scope,
            created_at: Utc::now(),
            expires_at: grant.expires_at,
            revoked_at: None,
            is_transitive: grant.transitive,
            state: DelegationState::Active,
            metadata: grant.metadata,
        };

        let delegation = self.delegations.create(delegation).await?;

        info!(
            "Delegation {} granted: {} -> {} ({:?} x {:?})",
            delegation.id,
            delegation.delegator_id,
            delegation.delegate_id,
            delegation.scope.resources,
            delegation.scope.actions
        );

        Ok(delegation)
    }

    /// Revoke a delegation; revoking one that already ended is a no-op
    pub async fn revoke(&self, delegation_id: &str) -> Result<()> {
        self.delegations.revoke(delegation_id, Utc::now()).await?;
        info!("Delegation {} revoked", delegation_id);
        Ok(())
    }

    /// Delegations currently held by a subject, oldest first
    pub async fn active(&self, subject_id: &str) -> Result<Vec<Delegation>> {
        self.delegations.find_active_for_delegate(subject_id).await
    }

    /// Whether `subject` could delegate the given scope
    ///
    /// # Errors
    /// Only repository failures; a rejected scope is `Ok(false)`.
    pub async fn can_delegate<R, A>(
        &self,
        subject: &Subject,
        resources: R,
        actions: A,
        domain: Option<&str>,
    ) -> Result<bool>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let mut scope = DelegationScope::new(resources, actions);
        scope.domain = domain.map(str::to_string);

        match self.validator.validate(subject, &subject.id, &scope, false).await {
            Ok(()) => Ok(true),
            Err(AuthzError::DelegationValidationFailed(reason)) => {
                debug!("{} cannot delegate: {}", subject.id, reason);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Decide a request using the subject's own policy and its delegations
    ///
    /// Only an implicit deny falls through to delegations; a matching `Deny`
    /// rule is final. A covering delegation grants access only while its
    /// delegator, or someone up its transitive chain, is still allowed the
    /// request by policy.
    pub async fn check_access(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Result<Effect> {
        let policy = self.policies.get_policies_for(subject, resource).await?;
        let decision = self.evaluator.explain(&policy, subject, resource, action, domain);

        if !decision.is_implicit_deny() {
            return Ok(decision.effect);
        }

        let domain_id = domain.map(|d| d.id.as_str());
        let covering: Vec<Delegation> = self
            .active(&subject.id)
            .await?
            .into_iter()
            .filter(|d| d.covers(&resource.id, &action.name, domain_id))
            .collect();

        if covering.is_empty() {
            return Ok(Effect::Deny);
        }

        let mut visited: HashSet<String> = HashSet::from([subject.id.clone()]);
        let mut frontier: VecDeque<String> = covering
            .iter()
            .map(|d| d.delegator_id.clone())
            .filter(|id| visited.insert(id.clone()))
            .collect();
        let mut hops = 0;

        while !frontier.is_empty() && hops < self.max_chain_depth {
            let mut next = VecDeque::new();

            while let Some(delegator_id) = frontier.pop_front() {
                let delegator = Subject::new(delegator_id.as_str());
                let policy = self.policies.get_policies_for(&delegator, resource).await?;
                let decision = self
                    .evaluator
                    .explain(&policy, &delegator, resource, action, domain);

                if decision.effect == Effect::Allow {
                    debug!(
                        "{} allowed {} on {} via delegation chain held by {}",
                        subject.id, action.name, resource.id, delegator_id
                    );
                    return Ok(Effect::Allow);
                }
                if !decision.is_implicit_deny() {
                    continue;
                }

                for received in self.active(&delegator_id).await? {
                    if received.is_transitive
                        && received.covers(&resource.id, &action.name, domain_id)
                        && visited.insert(received.delegator_id.clone())
                    {
                        next.push_back(received.delegator_id);
                    }
                }
            }

            frontier = next;
            hops += 1;
        }

        debug!(
            "{} denied {} on {}: no delegator in {} covering delegations holds it",
            subject.id,
            action.name,
            resource.id,
            covering.len()
        );
        Ok(Effect::Deny)
    }

    /// Persist `Expired` on delegations whose expiry has passed
    pub async fn expire_elapsed(&self) -> Result<usize> {
        let expired = self.delegations.expire_elapsed(Utc::now()).await?;
        if expired > 0 {
            info!("Expired {} delegations", expired);
        }
        Ok(expired)
    }

    /// Purge revoked and expired delegations past the retention window
    pub async fn cleanup(&self) -> Result<usize> {
        let purged = self.delegations.cleanup().await?;
        if purged > 0 {
            info!("Cleaned up {} delegations", purged);
        } else {
            debug!("Delegation cleanup found nothing to purge");
        }
        Ok(purged)
    }
}
