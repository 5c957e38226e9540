pub mod config;
pub mod models;
pub mod services;

use parking_lot::RwLock;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::config::RightsConfig;
use crate::models::{Actor, Grant, GrantModifier, Grantee, Right, RightClass, Target, TargetType};
use crate::services::{
    AccessContext, AccessError, AttributeFilter, Evaluator, GrantBackend, GrantStore,
    GroupDirectory, RightCatalog, Verdict,
};

/// The authorization core, created once at start-up and passed to every handler.
pub struct RightsService {
    catalog: RwLock<Arc<RightCatalog>>,
    store: Arc<GrantStore>,
    evaluator: Arc<Evaluator>,
}

impl RightsService {
    /// Build the catalog from configuration and open the grant store.
    pub async fn bootstrap(
        config: &RightsConfig,
        backend: Arc<dyn GrantBackend>,
        directory: Arc<dyn GroupDirectory>,
    ) -> Result<Self, AppError> {
        let catalog = RightCatalog::load(config.rights_definition_path.as_deref())?;
        let service = Self::new(catalog, backend, directory, config.lookup_timeout()).await?;
        Ok(service)
    }

    pub async fn new(
        catalog: RightCatalog,
        backend: Arc<dyn GrantBackend>,
        directory: Arc<dyn GroupDirectory>,
        lookup_timeout: Duration,
    ) -> Result<Self, AccessError> {
        let store = Arc::new(GrantStore::open(backend, lookup_timeout).await?);
        let evaluator = Arc::new(Evaluator::new(store.clone(), directory, lookup_timeout));
        Ok(Self {
            catalog: RwLock::new(Arc::new(catalog)),
            store,
            evaluator,
        })
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<RightCatalog> {
        self.catalog.read().clone()
    }

    /// Fresh context for one request.
    pub fn for_actor(&self, actor: Actor) -> AccessContext {
        AccessContext::new(actor, self.catalog(), self.evaluator.clone())
    }

    pub async fn check_right(
        &self,
        actor: &Actor,
        target: &Target,
        right: &str,
    ) -> Result<Verdict, AccessError> {
        self.for_actor(actor.clone()).check_right(target, right).await
    }

    pub async fn attribute_filter(
        &self,
        actor: &Actor,
        target: &Target,
    ) -> Result<Arc<AttributeFilter>, AccessError> {
        self.for_actor(actor.clone()).attribute_filter(target).await
    }

    #[instrument(
        skip(self, grantor, grantee, target),
        fields(grantor = %grantor.id, grantee = %grantee, entry = %target)
    )]
    pub async fn grant_right(
        &self,
        grantor: &Actor,
        grantee: Grantee,
        target: Target,
        right: &str,
        modifier: GrantModifier,
    ) -> Result<Grant, AccessError> {
        let result = match self.authorize_delegation(grantor, &target, right).await {
            Ok(()) => self.store.grant(grantee, target, right, modifier).await,
            Err(err) => Err(err),
        };

        record_mutation("grant", &result);
        if let Ok(grant) = &result {
            tracing::info!(grant_id = %grant.grant_id, grant = %grant, "Right granted");
        }
        result
    }

    #[instrument(
        skip(self, grantor, grantee, target),
        fields(grantor = %grantor.id, grantee = %grantee, entry = %target)
    )]
    pub async fn revoke_right(
        &self,
        grantor: &Actor,
        grantee: &Grantee,
        target: &Target,
        right: &str,
        modifier: GrantModifier,
    ) -> Result<Grant, AccessError> {
        let result = match self.authorize_delegation(grantor, target, right).await {
            Ok(()) => self.store.revoke(grantee, target, right, modifier).await,
            Err(err) => Err(err),
        };

        record_mutation("revoke", &result);
        if let Ok(grant) = &result {
            tracing::info!(grant_id = %grant.grant_id, grant = %grant, "Right revoked");
        }
        result
    }

    /// Rights in name order, optionally restricted to a target type and class.
    pub fn list_rights(
        &self,
        target_type: Option<TargetType>,
        class: Option<RightClass>,
    ) -> Vec<Arc<Right>> {
        self.catalog().list(target_type, class)
    }

    pub fn get_right(&self, name: &str) -> Result<Arc<Right>, AccessError> {
        self.catalog().lookup(name).cloned()
    }

    /// Replace the whole catalog. Contexts created earlier keep their table.
    pub fn reload_catalog(&self, catalog: RightCatalog) {
        let rights = catalog.len();
        *self.catalog.write() = Arc::new(catalog);
        tracing::info!(rights, "Right catalog reloaded");
    }

    /// Re-read persisted grants written outside this process.
    pub async fn refresh_grants(&self) -> Result<usize, AccessError> {
        self.store.refresh().await
    }

    pub fn grants_on(&self, target: &Target) -> Vec<Grant> {
        self.store.grants_on(target)
    }

    pub fn grants_for(&self, grantee: &Grantee) -> Vec<Grant> {
        self.store.grants_for(grantee)
    }

    async fn authorize_delegation(
        &self,
        grantor: &Actor,
        target: &Target,
        right: &str,
    ) -> Result<(), AccessError> {
        let decision = self.for_actor(grantor.clone()).can_delegate(target, right).await?;
        if decision.verdict.is_allowed() {
            return Ok(());
        }
        tracing::warn!(
            grantor = %grantor.id,
            right,
            entry = %target,
            "Grantor lacks delegable right"
        );
        Err(AccessError::GrantorInsufficientRights {
            grantor: grantor.id.clone(),
            right: right.to_string(),
            target: target.clone(),
        })
    }
}

fn record_mutation(op: &'static str, result: &Result<Grant, AccessError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!(
        "rights_grant_mutations_total",
        "op" => op,
        "outcome" => outcome
    )
    .increment(1);
}
