mod common;

use common::*;
use proptest::prelude::*;
use rights_service::models::{AccessMode, Actor, GrantModifier, Grantee, RightClass, TargetType};
use rights_service::services::RightCatalog;
use std::future::Future;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn account_rights() -> Vec<String> {
    RightCatalog::builtin()
        .unwrap()
        .list(Some(TargetType::Account), Some(RightClass::Preset))
        .into_iter()
        .filter(|r| !r.always_allow)
        .map(|r| r.name.clone())
        .collect()
}

fn attr_and_combo_rights() -> Vec<String> {
    let catalog = RightCatalog::builtin().unwrap();
    catalog
        .list(Some(TargetType::Account), None)
        .into_iter()
        .filter(|r| r.class != RightClass::Preset)
        .map(|r| r.name.clone())
        .collect()
}

fn arb_right() -> impl Strategy<Value = String> {
    prop::sample::select(account_rights())
}

fn arb_local() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn arb_domain() -> impl Strategy<Value = String> {
    "[a-z]{1,6}\\.(com|org|net)"
}

fn arb_modifier() -> impl Strategy<Value = GrantModifier> {
    prop_oneof![
        Just(GrantModifier::Positive),
        Just(GrantModifier::Negative),
        Just(GrantModifier::Delegable),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Positive at the domain, negative at one account: that account is
    /// denied and every sibling allowed.
    #[test]
    fn closest_scope_wins_and_deny_wins(
        right in arb_right(),
        target_local in arb_local(),
        sibling_local in arb_local(),
        dom in arb_domain(),
        grantee in prop_oneof![Just(admin("bob")), Just(Grantee::AllAdmins)],
    ) {
        prop_assume!(target_local != sibling_local);
        let (target_allowed, sibling_allowed) = block_on(async {
            let rights = TestRights::new().await;
            let target = account(&format!("{}@{}", target_local, dom));
            let sibling = account(&format!("{}@{}", sibling_local, dom));
            rights.seed(grantee.clone(), domain(&dom), &right, GrantModifier::Positive).await;
            rights.seed(grantee, target.clone(), &right, GrantModifier::Negative).await;

            let bob = Actor::admin("bob");
            (
                rights.allowed(&bob, &target, &right).await,
                rights.allowed(&bob, &sibling, &right).await,
            )
        });
        prop_assert!(!target_allowed);
        prop_assert!(sibling_allowed);
    }

    /// Without any grant in the chain, every right is denied.
    #[test]
    fn default_deny(
        right in arb_right(),
        local in arb_local(),
        dom in arb_domain(),
        actor_id in arb_local(),
    ) {
        let allowed = block_on(async {
            let rights = TestRights::new().await;
            // noise on an unrelated domain
            rights
                .seed(
                    admin(&actor_id),
                    domain("unrelated.invalid"),
                    &right,
                    GrantModifier::Positive,
                )
                .await;
            rights
                .allowed(&Actor::admin(&actor_id), &account(&format!("{}@{}", local, dom)), &right)
                .await
        });
        prop_assert!(!allowed);
    }

    /// Granting then revoking the same grant restores the earlier verdict,
    /// whatever else is already granted.
    #[test]
    fn grant_revoke_round_trip(
        right in arb_right(),
        existing in prop::collection::vec((arb_right(), arb_modifier()), 0..4),
        modifier in arb_modifier(),
        at_domain in any::<bool>(),
    ) {
        let (before, after) = block_on(async {
            let rights = TestRights::new().await;
            let target = account("a@example.com");
            for (existing_right, existing_modifier) in existing {
                let _ = rights
                    .service
                    .grant_right(
                        &root(),
                        admin("bob"),
                        domain("example.com"),
                        &existing_right,
                        existing_modifier,
                    )
                    .await;
            }

            let bob = Actor::admin("bob");
            let before = rights.allowed(&bob, &target, &right).await;

            let scope = if at_domain { domain("example.com") } else { target.clone() };
            let granted = rights
                .service
                .grant_right(&root(), admin("bob"), scope.clone(), &right, modifier)
                .await;
            if granted.is_ok() {
                rights
                    .service
                    .revoke_right(&root(), &admin("bob"), &scope, &right, modifier)
                    .await
                    .unwrap();
            }
            (before, rights.allowed(&bob, &target, &right).await)
        });
        prop_assert_eq!(before, after);
    }

    /// Granting the same grant twice leaves the store as after the first.
    #[test]
    fn duplicate_grant_is_rejected(right in arb_right(), modifier in arb_modifier()) {
        let (second_failed, count) = block_on(async {
            let rights = TestRights::new().await;
            rights.seed(admin("bob"), domain("example.com"), &right, modifier).await;
            let second = rights
                .service
                .grant_right(&root(), admin("bob"), domain("example.com"), &right, modifier)
                .await;
            (second.is_err(), rights.backend.len())
        });
        prop_assert!(second_failed);
        prop_assert_eq!(count, 1);
    }

    /// An attribute is writable only when a held right (directly or through a
    /// combo) grants write access to that exact attribute.
    #[test]
    fn writable_needs_write_right(
        granted in prop::collection::vec(prop::sample::select(attr_and_combo_rights()), 0..5),
    ) {
        let catalog = RightCatalog::builtin().unwrap();
        let filter = block_on(async {
            let rights = TestRights::new().await;
            for right in &granted {
                let _ = rights
                    .service
                    .grant_right(
                        &root(),
                        admin("bob"),
                        domain("example.com"),
                        right,
                        GrantModifier::Positive,
                    )
                    .await;
            }
            rights
                .service
                .attribute_filter(&Actor::admin("bob"), &account("a@example.com"))
                .await
                .unwrap()
        });

        let target_type = TargetType::Account;
        for right in catalog.attr_rights_for(target_type) {
            let Some(spec) = &right.attr else { continue };
            if !filter.can_write(&spec.attribute) {
                continue;
            }
            let backed = catalog.attr_rights_for(target_type).any(|candidate| {
                candidate
                    .attr
                    .as_ref()
                    .is_some_and(|a| a.attribute == spec.attribute && a.mode != AccessMode::Read)
                    && catalog
                        .implying(&candidate.name)
                        .is_some_and(|implying| granted.iter().any(|g| implying.contains(g)))
            });
            prop_assert!(backed, "{} writable without a write right", spec.attribute);
        }
    }
}
