//! Evaluator - resolves a right on a target into a verdict.
//!
//! Resolution walks the scope chain narrowest first. The first scope level
//! holding any grant matching the actor and the right (or a combo implying it)
//! decides; within that level a negative grant beats every positive one. No
//! match anywhere is a deny.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Actor, ActorKind, Grant, GranteeSet, Right, Target};
use crate::services::catalog::RightCatalog;
use crate::services::deadline::bounded;
use crate::services::directory::GroupDirectory;
use crate::services::error::AccessError;
use crate::services::hierarchy::{ScopeLevel, scope_chain};
use crate::services::store::GrantStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        *self == Verdict::Allow
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        }
    }
}

/// What a verdict was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    AlwaysAllow,
    GlobalAdmin,
    Grant,
    NoMatchingGrant,
}

/// A verdict with the grants that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub basis: DecisionBasis,
    /// Scope the deciding grants were made on.
    pub scope: Option<Target>,
    /// Deciding grants: the negative ones on a deny, the positive ones on an allow.
    pub via: Vec<Grant>,
}

impl Decision {
    fn without_grant(verdict: Verdict, basis: DecisionBasis) -> Self {
        Self {
            verdict,
            basis,
            scope: None,
            via: Vec::new(),
        }
    }
}

/// Which grants a resolution may count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    /// Executing the right on the target.
    Check,
    /// Granting or revoking the right on the target; only delegable grants allow.
    Delegate,
}

pub struct Evaluator {
    store: Arc<GrantStore>,
    directory: Arc<dyn GroupDirectory>,
    timeout: Duration,
}

impl Evaluator {
    pub fn new(
        store: Arc<GrantStore>,
        directory: Arc<dyn GroupDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            timeout,
        }
    }

    /// Every grantee whose grants apply to `actor`, group memberships included.
    pub async fn grantees_of(&self, actor: &Actor) -> Result<GranteeSet, AccessError> {
        if actor.kind == ActorKind::Anonymous {
            return Ok(GranteeSet::for_actor(actor, Vec::new()));
        }
        let groups = bounded(
            self.timeout,
            "group_directory.groups_of",
            self.directory.groups_of(&actor.id),
        )
        .await?;
        Ok(GranteeSet::for_actor(
            actor,
            groups.into_iter().map(|m| m.group_id),
        ))
    }

    pub async fn scope_chain(&self, target: &Target) -> Result<Vec<ScopeLevel>, AccessError> {
        let memberships = match target.identity() {
            Some(id) if target.target_type().can_be_group_member() => {
                bounded(
                    self.timeout,
                    "group_directory.groups_of",
                    self.directory.groups_of(id),
                )
                .await?
            }
            _ => Vec::new(),
        };
        Ok(scope_chain(target, &memberships))
    }

    /// Decide whether `actor` may execute `right` on `target`.
    pub async fn decide(
        &self,
        catalog: &RightCatalog,
        actor: &Actor,
        grantees: &GranteeSet,
        target: &Target,
        right: &str,
    ) -> Result<Decision, AccessError> {
        let resolved = catalog.lookup(right)?;
        if !resolved.applies_to(target.target_type()) {
            return Err(invalid_target(resolved, target));
        }

        let decision = if resolved.always_allow {
            Decision::without_grant(Verdict::Allow, DecisionBasis::AlwaysAllow)
        } else if actor.is_global_admin() {
            Decision::without_grant(Verdict::Allow, DecisionBasis::GlobalAdmin)
        } else {
            self.resolve(catalog, grantees, target, resolved, Purpose::Check)
                .await?
        };

        metrics::counter!("rights_decisions_total", "verdict" => decision.verdict.as_str())
            .increment(1);
        if !decision.verdict.is_allowed() {
            tracing::debug!(
                actor = %actor.id,
                right,
                entry = %target,
                basis = ?decision.basis,
                "Right denied"
            );
        }
        Ok(decision)
    }

    /// Decide whether `actor` may grant or revoke `right` on `target`.
    ///
    /// The target may be any type the right is grantable on, not only the
    /// types it executes on.
    pub async fn decide_delegation(
        &self,
        catalog: &RightCatalog,
        actor: &Actor,
        grantees: &GranteeSet,
        target: &Target,
        right: &str,
    ) -> Result<Decision, AccessError> {
        let resolved = catalog.lookup(right)?;
        if !resolved.grantable_on(target.target_type()) {
            return Err(invalid_target(resolved, target));
        }
        if actor.is_global_admin() {
            return Ok(Decision::without_grant(
                Verdict::Allow,
                DecisionBasis::GlobalAdmin,
            ));
        }
        self.resolve(catalog, grantees, target, resolved, Purpose::Delegate)
            .await
    }

    async fn resolve(
        &self,
        catalog: &RightCatalog,
        grantees: &GranteeSet,
        target: &Target,
        right: &Right,
        purpose: Purpose,
    ) -> Result<Decision, AccessError> {
        let implying = catalog
            .implying(&right.name)
            .ok_or_else(|| AccessError::NoSuchRight(right.name.clone()))?;
        let chain = self.scope_chain(target).await?;
        // one snapshot for the whole walk
        let grants = self.store.snapshot();

        for level in &chain {
            let matched: Vec<&Grant> = level
                .targets
                .iter()
                .flat_map(|scope| grants.query(grantees, scope, implying))
                .filter(|g| {
                    purpose == Purpose::Check || g.modifier.is_deny() || g.modifier.can_delegate()
                })
                .collect();
            if matched.is_empty() {
                continue;
            }

            let denied = matched.iter().any(|g| g.modifier.is_deny());
            let verdict = if denied { Verdict::Deny } else { Verdict::Allow };
            let via: Vec<Grant> = matched
                .into_iter()
                .filter(|g| g.modifier.is_deny() == denied)
                .cloned()
                .collect();
            return Ok(Decision {
                verdict,
                basis: DecisionBasis::Grant,
                scope: via.first().map(|g| g.target.clone()),
                via,
            });
        }

        Ok(Decision::without_grant(
            Verdict::Deny,
            DecisionBasis::NoMatchingGrant,
        ))
    }
}

fn invalid_target(right: &Right, target: &Target) -> AccessError {
    AccessError::InvalidTarget {
        right: right.name.clone(),
        target_type: target.target_type(),
    }
}
