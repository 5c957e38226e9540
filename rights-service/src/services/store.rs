//! Grant store - the only mutable shared state of the core.
//!
//! Readers take an `Arc` snapshot of the whole grant set and never block on
//! writers. Writers are serialized, persist through the backend first and only
//! then publish a new snapshot. When a write fails or times out the store
//! reloads from the backend, so the snapshot never drifts from what was
//! actually committed.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Grant, GrantKey, GrantModifier, Grantee, GranteeSet, Target};
use crate::services::deadline::bounded;
use crate::services::error::{AccessError, BackendError};

/// Persistence for grant records.
///
/// Both writes are idempotent so a retried call never duplicates or fails on
/// work an earlier, unacknowledged call already committed.
#[async_trait]
pub trait GrantBackend: Send + Sync {
    async fn load(&self) -> Result<Vec<Grant>, BackendError>;

    /// Upsert keyed by [`Grant::key`]. A stored grant colliding with `grant`
    /// is replaced.
    async fn insert(&self, grant: &Grant) -> Result<(), BackendError>;

    /// Delete by id. Deleting a grant that is no longer stored succeeds.
    async fn delete(&self, grant_id: Uuid) -> Result<(), BackendError>;
}

/// Backend held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    grants: DashMap<GrantKey, Grant>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let backend = Self::new();
        for grant in grants {
            backend.grants.insert(grant.key(), grant);
        }
        backend
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[async_trait]
impl GrantBackend for MemoryBackend {
    async fn load(&self) -> Result<Vec<Grant>, BackendError> {
        let mut grants: Vec<Grant> = self.grants.iter().map(|g| g.value().clone()).collect();
        grants.sort_by_key(|g| g.granted_at);
        Ok(grants)
    }

    async fn insert(&self, grant: &Grant) -> Result<(), BackendError> {
        self.grants.insert(grant.key(), grant.clone());
        Ok(())
    }

    async fn delete(&self, grant_id: Uuid) -> Result<(), BackendError> {
        self.grants.retain(|_, g| g.grant_id != grant_id);
        Ok(())
    }
}

/// Immutable grant set, indexed by the target (scope) grants were made on.
#[derive(Debug, Clone, Default)]
pub struct GrantSet {
    by_scope: HashMap<Target, Vec<Grant>>,
}

impl GrantSet {
    /// Build a set from persisted grants. Of colliding grants only the most
    /// recent survives.
    pub fn from_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let mut grants: Vec<Grant> = grants.into_iter().collect();
        grants.sort_by_key(|g| g.granted_at);

        let mut by_scope: HashMap<Target, Vec<Grant>> = HashMap::new();
        for grant in grants {
            let scope = by_scope.entry(grant.target.clone()).or_default();
            if let Some(stale) = scope.iter_mut().find(|g| g.collides_with(&grant)) {
                tracing::warn!(
                    kept = %grant.grant_id,
                    dropped = %stale.grant_id,
                    grant = %grant,
                    "Merged colliding grants"
                );
                *stale = grant;
            } else {
                scope.push(grant);
            }
        }
        Self { by_scope }
    }

    /// Grants made directly on `scope`.
    pub fn at(&self, scope: &Target) -> &[Grant] {
        self.by_scope.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Grants on `scope` to any of `grantees` for any of `rights`.
    pub fn query(
        &self,
        grantees: &GranteeSet,
        scope: &Target,
        rights: &HashSet<String>,
    ) -> Vec<&Grant> {
        self.at(scope)
            .iter()
            .filter(|g| grantees.contains(&g.grantee) && rights.contains(&g.right))
            .collect()
    }

    /// The live grant holding `key`, if any.
    pub fn find(&self, key: &GrantKey) -> Option<&Grant> {
        self.at(&key.target).iter().find(|g| g.has_key(key))
    }

    pub fn contains(&self, grant: &Grant) -> bool {
        self.at(&grant.target)
            .iter()
            .any(|g| g.grant_id == grant.grant_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.by_scope.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_scope.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scope.is_empty()
    }

    fn with(&self, grant: Grant) -> Self {
        let mut next = self.clone();
        next.by_scope
            .entry(grant.target.clone())
            .or_default()
            .push(grant);
        next
    }

    fn without(&self, removed: &Grant) -> Self {
        let mut next = self.clone();
        if let Some(grants) = next.by_scope.get_mut(&removed.target) {
            grants.retain(|g| g.grant_id != removed.grant_id);
            if grants.is_empty() {
                next.by_scope.remove(&removed.target);
            }
        }
        next
    }
}

pub struct GrantStore {
    snapshot: RwLock<Arc<GrantSet>>,
    writer: Mutex<()>,
    backend: Arc<dyn GrantBackend>,
    timeout: Duration,
}

impl GrantStore {
    /// Load every persisted grant and start serving from that snapshot.
    pub async fn open(
        backend: Arc<dyn GrantBackend>,
        timeout: Duration,
    ) -> Result<Self, AccessError> {
        let grants = bounded(timeout, "grant_backend.load", backend.load()).await?;
        let set = GrantSet::from_grants(grants);
        tracing::info!(grants = set.len(), "Grant store loaded");
        Ok(Self {
            snapshot: RwLock::new(Arc::new(set)),
            writer: Mutex::new(()),
            backend,
            timeout,
        })
    }

    /// Current committed grant set. Evaluation walks one snapshot per
    /// decision through [`GrantSet::query`].
    pub fn snapshot(&self) -> Arc<GrantSet> {
        self.snapshot.read().clone()
    }

    pub async fn grant(
        &self,
        grantee: Grantee,
        target: Target,
        right: &str,
        modifier: GrantModifier,
    ) -> Result<Grant, AccessError> {
        let _writer = self.writer.lock().await;
        let current = self.snapshot();

        let grant = Grant::new(grantee, target, right.to_string(), modifier);
        if let Some(existing) = current.find(&grant.key()) {
            return Err(AccessError::AlreadyGranted {
                right: grant.right,
                target: grant.target,
                existing: existing.modifier,
            });
        }

        match bounded(self.timeout, "grant_backend.insert", self.backend.insert(&grant)).await {
            Ok(()) => {
                *self.snapshot.write() = Arc::new(current.with(grant.clone()));
                Ok(grant)
            }
            Err(err) => match self.reload().await {
                Ok(reloaded) if reloaded.contains(&grant) => {
                    tracing::warn!(grant = %grant, "Insert committed without acknowledgement");
                    Ok(grant)
                }
                _ => Err(err),
            },
        }
    }

    pub async fn revoke(
        &self,
        grantee: &Grantee,
        target: &Target,
        right: &str,
        modifier: GrantModifier,
    ) -> Result<Grant, AccessError> {
        let _writer = self.writer.lock().await;
        let current = self.snapshot();

        let key = GrantKey {
            grantee: grantee.clone(),
            target: target.clone(),
            right: right.to_string(),
            polarity: modifier.polarity(),
        };
        let existing = current
            .find(&key)
            .filter(|g| g.modifier == modifier)
            .cloned()
            .ok_or_else(|| AccessError::GrantNotFound {
                right: key.right.clone(),
                target: key.target.clone(),
                modifier,
            })?;

        let deleted = bounded(
            self.timeout,
            "grant_backend.delete",
            self.backend.delete(existing.grant_id),
        )
        .await;
        match deleted {
            Ok(()) => {
                *self.snapshot.write() = Arc::new(current.without(&existing));
                Ok(existing)
            }
            Err(err) => match self.reload().await {
                Ok(reloaded) if !reloaded.contains(&existing) => {
                    tracing::warn!(grant = %existing, "Delete committed without acknowledgement");
                    Ok(existing)
                }
                _ => Err(err),
            },
        }
    }

    /// Re-read the backend, picking up grants written by other processes.
    pub async fn refresh(&self) -> Result<usize, AccessError> {
        let _writer = self.writer.lock().await;
        let set = self.reload().await?;
        tracing::debug!(grants = set.len(), "Grant store refreshed");
        Ok(set.len())
    }

    /// Replace the snapshot with what the backend holds. Callers hold the
    /// writer lock.
    async fn reload(&self) -> Result<Arc<GrantSet>, AccessError> {
        let grants = bounded(self.timeout, "grant_backend.load", self.backend.load()).await?;
        let set = Arc::new(GrantSet::from_grants(grants));
        *self.snapshot.write() = set.clone();
        Ok(set)
    }

    /// Grants made directly on `target`.
    pub fn grants_on(&self, target: &Target) -> Vec<Grant> {
        let mut grants = self.snapshot().at(target).to_vec();
        grants.sort_by_key(|g| g.granted_at);
        grants
    }

    /// Grants issued to `grantee` on any target.
    pub fn grants_for(&self, grantee: &Grantee) -> Vec<Grant> {
        let mut grants: Vec<Grant> = self
            .snapshot()
            .iter()
            .filter(|g| &g.grantee == grantee)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.granted_at);
        grants
    }
}
