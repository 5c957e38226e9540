//! Test helper module for rights-service integration tests.
//!
//! Provides an in-memory service with a seeded catalog, grant backend and
//! group directory.

#![allow(dead_code)]

use rights_service::{
    RightsService,
    models::{Actor, Grant, GrantModifier, Grantee, Target},
    services::{InMemoryDirectory, MemoryBackend, RightCatalog},
};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

pub struct TestRights {
    pub service: RightsService,
    pub backend: Arc<MemoryBackend>,
    pub directory: Arc<InMemoryDirectory>,
}

impl TestRights {
    pub async fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let service = RightsService::new(
            RightCatalog::builtin().expect("built-in catalog"),
            backend.clone(),
            directory.clone(),
            TEST_TIMEOUT,
        )
        .await
        .expect("Failed to start rights service");
        Self {
            service,
            backend,
            directory,
        }
    }

    /// Grant as a global admin, bypassing the delegation check.
    pub async fn seed(
        &self,
        grantee: Grantee,
        target: Target,
        right: &str,
        modifier: GrantModifier,
    ) -> Grant {
        self.service
            .grant_right(&root(), grantee, target, right, modifier)
            .await
            .expect("Failed to seed grant")
    }

    pub async fn allowed(&self, actor: &Actor, target: &Target, right: &str) -> bool {
        self.service
            .check_right(actor, target, right)
            .await
            .expect("check_right failed")
            .is_allowed()
    }
}

pub fn root() -> Actor {
    Actor::global_admin("root")
}

pub fn admin(id: &str) -> Grantee {
    Grantee::Admin(id.to_string())
}

pub fn group(id: &str) -> Grantee {
    Grantee::Group(id.to_string())
}

pub fn account(id: &str) -> Target {
    Target::Account(id.to_string())
}

pub fn domain(id: &str) -> Target {
    Target::Domain(id.to_string())
}

pub fn server(id: &str) -> Target {
    Target::Server(id.to_string())
}

pub fn dl(id: &str) -> Target {
    Target::DistributionList(id.to_string())
}
