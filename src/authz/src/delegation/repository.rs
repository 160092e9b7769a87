//! Delegation storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{Delegation, DelegationState};
use crate::config::DelegationConfig;
use crate::error::{AuthzError, Result};

/// Delegation repository trait
///
/// Implementations persist delegation records. Apart from `create` and
/// `revoke`, the only state transition a backend performs is the expiry
/// sweep.
#[async_trait]
pub trait DelegationRepository: Send + Sync {
    /// Persist a new delegation
    async fn create(&self, delegation: Delegation) -> Result<Delegation>;

    /// Look up a delegation by id, in any state
    async fn find_by_id(&self, id: &str) -> Result<Option<Delegation>>;

    /// Active, unexpired delegations received by a subject, oldest first
    async fn find_active_for_delegate(&self, delegate_id: &str) -> Result<Vec<Delegation>>;

    /// Mark a delegation revoked
    ///
    /// # Errors
    /// `DelegationNotFound` if no delegation has this id. Only an active
    /// delegation changes; revoked and expired records are left as they are.
    async fn revoke(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Persist `Expired` on active delegations whose expiry has passed
    async fn expire_elapsed(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Purge revoked and expired delegations older than the retention window
    async fn cleanup(&self) -> Result<usize>;
}

/// In-memory delegation repository implementation
///
/// Records are kept in insertion order, which makes ordering by creation
/// time stable for delegations created in the same instant.
pub struct InMemoryDelegationRepository {
    delegations: Arc<RwLock<Vec<Delegation>>>,
    retention: std::time::Duration,
}

impl InMemoryDelegationRepository {
    /// Create a new in-memory repository with default retention
    pub fn new() -> Self {
        Self::with_config(&DelegationConfig::default())
    }

    pub fn with_config(config: &DelegationConfig) -> Self {
        Self {
            delegations: Arc::new(RwLock::new(Vec::new())),
            retention: config.retention(),
        }
    }

    /// Number of stored delegations in any state
    pub async fn len(&self) -> usize {
        self.delegations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.delegations.read().await.is_empty()
    }
}

impl Default for InMemoryDelegationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelegationRepository for InMemoryDelegationRepository {
    async fn create(&self, delegation: Delegation) -> Result<Delegation> {
        let mut delegations = self.delegations.write().await;

        if delegations.iter().any(|d| d.id == delegation.id) {
            return Err(AuthzError::Repository(format!(
                "Delegation {} already exists",
                delegation.id
            )));
        }

        delegations.push(delegation.clone());
        Ok(delegation)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Delegation>> {
        let delegations = self.delegations.read().await;
        Ok(delegations.iter().find(|d| d.id == id).cloned())
    }

    async fn find_active_for_delegate(&self, delegate_id: &str) -> Result<Vec<Delegation>> {
        let now = Utc::now();
        let delegations = self.delegations.read().await;

        let mut active: Vec<Delegation> = delegations
            .iter()
            .filter(|d| d.delegate_id == delegate_id && d.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|d| d.created_at);

        Ok(active)
    }

    async fn revoke(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut delegations = self.delegations.write().await;
        let delegation = delegations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AuthzError::DelegationNotFound(id.to_string()))?;

        if delegation.state == DelegationState::Active {
            delegation.state = DelegationState::Revoked;
            delegation.revoked_at = Some(at);
        }

        Ok(())
    }

    async fn expire_elapsed(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut delegations = self.delegations.write().await;
        let mut expired = 0;

        for delegation in delegations.iter_mut() {
            let elapsed = delegation.expires_at.map_or(false, |at| at <= now);
            if delegation.state == DelegationState::Active && elapsed {
                delegation.state = DelegationState::Expired;
                expired += 1;
            }
        }

        Ok(expired)
    }

    async fn cleanup(&self) -> Result<usize> {
        let cutoff = chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention));

        // A retention window too large to represent keeps everything
        let Some(cutoff) = cutoff else {
            return Ok(0);
        };

        let mut delegations = self.delegations.write().await;
        let before = delegations.len();
        delegations.retain(|d| d.ended_at().map_or(true, |ended| ended > cutoff));
        let purged = before - delegations.len();

        debug!("Purged {} delegations that ended before {}", purged, cutoff);
        Ok(purged)
    }
}
