//! Per-request access context.
//!
//! A context is built at request entry for one actor, passed to every
//! collaborator needing authorization and dropped with the request. It
//! memoizes decisions and attribute filters for that request only; faults are
//! never cached, so a retried call re-consults the store.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{AccessMode, Actor, GranteeSet, Target};
use crate::services::attr_filter::AttributeFilter;
use crate::services::catalog::RightCatalog;
use crate::services::error::AccessError;
use crate::services::evaluator::{Decision, Evaluator, Verdict};

pub struct AccessContext {
    actor: Actor,
    catalog: Arc<RightCatalog>,
    evaluator: Arc<Evaluator>,
    grantees: Option<Arc<GranteeSet>>,
    decisions: HashMap<(Target, String), Decision>,
    filters: HashMap<Target, Arc<AttributeFilter>>,
}

impl AccessContext {
    pub fn new(actor: Actor, catalog: Arc<RightCatalog>, evaluator: Arc<Evaluator>) -> Self {
        Self {
            actor,
            catalog,
            evaluator,
            grantees: None,
            decisions: HashMap::new(),
            filters: HashMap::new(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Catalog this context was created with.
    pub fn catalog(&self) -> &RightCatalog {
        &self.catalog
    }

    async fn grantees(&mut self) -> Result<Arc<GranteeSet>, AccessError> {
        if let Some(grantees) = &self.grantees {
            return Ok(grantees.clone());
        }
        let grantees = if self.actor.is_global_admin() {
            // bypasses grants; no need to reach the directory
            GranteeSet::for_actor(&self.actor, Vec::new())
        } else {
            self.evaluator.grantees_of(&self.actor).await?
        };
        let grantees = Arc::new(grantees);
        self.grantees = Some(grantees.clone());
        Ok(grantees)
    }

    /// Verdict plus the grants and scope that produced it.
    pub async fn explain(&mut self, target: &Target, right: &str) -> Result<Decision, AccessError> {
        let key = (target.clone(), right.to_string());
        if let Some(decision) = self.decisions.get(&key) {
            return Ok(decision.clone());
        }

        let grantees = self.grantees().await?;
        let decision = self
            .evaluator
            .decide(&self.catalog, &self.actor, &grantees, target, right)
            .await?;
        self.decisions.insert(key, decision.clone());
        Ok(decision)
    }

    pub async fn check_right(
        &mut self,
        target: &Target,
        right: &str,
    ) -> Result<Verdict, AccessError> {
        Ok(self.explain(target, right).await?.verdict)
    }

    /// Like `check_right`, with a deny turned into `PermissionDenied`.
    pub async fn require_right(&mut self, target: &Target, right: &str) -> Result<(), AccessError> {
        match self.check_right(target, right).await? {
            Verdict::Allow => Ok(()),
            Verdict::Deny => {
                tracing::warn!(
                    actor = %self.actor.id,
                    right,
                    entry = %target,
                    "Permission denied"
                );
                Err(AccessError::permission_denied(right, target))
            }
        }
    }

    /// Whether the actor may grant or revoke `right` on `target`.
    pub async fn can_delegate(
        &mut self,
        target: &Target,
        right: &str,
    ) -> Result<Decision, AccessError> {
        let grantees = self.grantees().await?;
        self.evaluator
            .decide_delegation(&self.catalog, &self.actor, &grantees, target, right)
            .await
    }

    /// Attribute filter for `target`, built once per context.
    pub async fn attribute_filter(
        &mut self,
        target: &Target,
    ) -> Result<Arc<AttributeFilter>, AccessError> {
        if let Some(filter) = self.filters.get(target) {
            return Ok(filter.clone());
        }

        let catalog = self.catalog.clone();
        let target_type = target.target_type();

        let mut held: Vec<(String, AccessMode)> = Vec::new();
        for right in catalog.attr_rights_for(target_type) {
            let Some(spec) = &right.attr else { continue };
            if self.check_right(target, &right.name).await?.is_allowed() {
                held.push((spec.attribute.clone(), spec.mode));
            }
        }

        let mut full_read = false;
        for right in catalog.full_read_rights_for(target_type) {
            if self.check_right(target, &right.name).await?.is_allowed() {
                full_read = true;
                break;
            }
        }

        let filter = Arc::new(AttributeFilter::new(target.clone(), full_read, held));
        self.filters.insert(target.clone(), filter.clone());
        Ok(filter)
    }

    /// Subset of `targets` on which the actor holds `right`, in input order.
    pub async fn filter_allowed<I>(
        &mut self,
        targets: I,
        right: &str,
    ) -> Result<Vec<Target>, AccessError>
    where
        I: IntoIterator<Item = Target>,
    {
        let mut allowed = Vec::new();
        for target in targets {
            if self.check_right(&target, right).await?.is_allowed() {
                allowed.push(target);
            }
        }
        Ok(allowed)
    }

    pub fn cached_decisions(&self) -> usize {
        self.decisions.len()
    }
}
