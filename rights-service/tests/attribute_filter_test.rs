mod common;

use common::*;
use rights_service::models::{Actor, GrantModifier, Target};
use rights_service::services::{AccessError, AttrAccess};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn test_no_rights_hides_everything() {
    let rights = TestRights::new().await;
    let filter = rights
        .service
        .attribute_filter(&Actor::admin("bob"), &account("a@example.com"))
        .await
        .unwrap();
    assert_eq!(filter.classify("displayName"), AttrAccess::Hidden);
    assert_eq!(filter.classify("zimbraMailQuota"), AttrAccess::Hidden);
}

#[tokio::test]
async fn test_attr_rights_classify_fields() {
    let rights = TestRights::new().await;
    rights
        .seed(
            admin("bob"),
            domain("example.com"),
            "set.account.displayName",
            GrantModifier::Positive,
        )
        .await;
    rights
        .seed(
            admin("bob"),
            domain("example.com"),
            "get.account.zimbraMailQuota",
            GrantModifier::Positive,
        )
        .await;
    rights
        .seed(
            admin("bob"),
            domain("example.com"),
            "reset.account.userPassword",
            GrantModifier::Positive,
        )
        .await;

    let filter = rights
        .service
        .attribute_filter(&Actor::admin("bob"), &account("a@example.com"))
        .await
        .unwrap();
    assert_eq!(filter.classify("displayname"), AttrAccess::ReadWrite);
    assert_eq!(filter.classify("zimbraMailQuota"), AttrAccess::Readable);
    assert_eq!(filter.classify("userPassword"), AttrAccess::Writable);
    assert_eq!(filter.classify("description"), AttrAccess::Hidden);
}

#[tokio::test]
async fn test_full_read_right_reveals_but_never_writes() {
    let rights = TestRights::new().await;
    rights
        .seed(admin("bob"), account("a@example.com"), "getAccount", GrantModifier::Positive)
        .await;

    let filter = rights
        .service
        .attribute_filter(&Actor::admin("bob"), &account("a@example.com"))
        .await
        .unwrap();
    assert_eq!(filter.classify("mail"), AttrAccess::Readable);
    assert_eq!(filter.classify("displayName"), AttrAccess::Readable);
    assert!(!filter.can_write("displayName"));
}

#[tokio::test]
async fn test_combo_implies_attr_rights() {
    let rights = TestRights::new().await;
    rights
        .seed(
            admin("bob"),
            domain("example.com"),
            "domainAdminAccountRights",
            GrantModifier::Positive,
        )
        .await;

    let filter = rights
        .service
        .attribute_filter(&Actor::admin("bob"), &account("a@example.com"))
        .await
        .unwrap();
    assert!(filter.can_write("displayName"));
    assert!(filter.can_write("description"));
    assert_eq!(filter.classify("zimbraMailQuota"), AttrAccess::Readable);
}

#[tokio::test]
async fn test_denied_attr_right_at_closer_scope() {
    let rights = TestRights::new().await;
    rights
        .seed(
            admin("bob"),
            domain("example.com"),
            "set.account.displayName",
            GrantModifier::Positive,
        )
        .await;
    rights
        .seed(
            admin("bob"),
            account("ceo@example.com"),
            "set.account.displayName",
            GrantModifier::Negative,
        )
        .await;

    let bob = Actor::admin("bob");
    let ceo = rights
        .service
        .attribute_filter(&bob, &account("ceo@example.com"))
        .await
        .unwrap();
    assert_eq!(ceo.classify("displayName"), AttrAccess::Hidden);

    let other = rights
        .service
        .attribute_filter(&bob, &account("other@example.com"))
        .await
        .unwrap();
    assert_eq!(other.classify("displayName"), AttrAccess::ReadWrite);
}

#[tokio::test]
async fn test_redact_and_check_modify() {
    let rights = TestRights::new().await;
    rights
        .seed(admin("bob"), Target::Config, "set.config.zimbraLogLevel", GrantModifier::Positive)
        .await;

    let filter = rights
        .service
        .attribute_filter(&Actor::admin("bob"), &Target::Config)
        .await
        .unwrap();

    let attrs: HashMap<String, String> = HashMap::from([
        ("zimbraLogLevel".to_string(), "debug".to_string()),
        ("zimbraMtaRelayHost".to_string(), "mta.example.com".to_string()),
    ]);
    let visible = filter.redact(attrs);
    assert_eq!(visible.len(), 1);
    assert!(visible.contains_key("zimbraLogLevel"));

    assert!(filter.check_modify(["zimbraLogLevel"]).is_ok());
    let err = filter
        .check_modify(["zimbraLogLevel", "zimbraMtaRelayHost"])
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::PermissionDenied { right, .. } if right.ends_with("zimbraMtaRelayHost")
    ));
}

#[tokio::test]
async fn test_filter_is_built_once_per_context() {
    let rights = TestRights::new().await;
    let mut ctx = rights.service.for_actor(Actor::admin("bob"));
    let first = ctx.attribute_filter(&account("a@example.com")).await.unwrap();
    let decisions = ctx.cached_decisions();
    assert!(decisions > 0);

    let second = ctx.attribute_filter(&account("a@example.com")).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.cached_decisions(), decisions);
}

#[tokio::test]
async fn test_global_admin_sees_and_writes_all_attr_rights() {
    let rights = TestRights::new().await;
    let filter = rights
        .service
        .attribute_filter(&root(), &account("a@example.com"))
        .await
        .unwrap();
    assert_eq!(filter.classify("displayName"), AttrAccess::ReadWrite);
    assert_eq!(filter.classify("mail"), AttrAccess::Readable);
}
