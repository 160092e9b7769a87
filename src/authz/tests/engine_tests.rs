//! Policy evaluation tests
//!
//! End-to-end decisions through `PolicyEvaluator` for every authorization
//! model and both resolution strategies.

mod common;

use common::{blog_policy, editor, init_tracing};
use cretoai_policy::{
    config::{AuthorizationModel, EvaluatorConfig, ResolutionStrategy},
    policy::{InMemoryPolicyRepository, PolicyRecord, PolicyRepository},
    Action, AuthzError, Domain, Effect, Policy, PolicyEvaluator, PolicyRule, Resource, Subject,
};
use proptest::prelude::*;
use serde_json::json;

fn evaluator(model: AuthorizationModel) -> PolicyEvaluator {
    PolicyEvaluator::from_config(&EvaluatorConfig {
        model,
        strategy: ResolutionStrategy::Standard,
    })
}

// ============================================================================
// RBAC
// ============================================================================

#[test]
fn test_editor_can_edit_post() {
    init_tracing();
    let effect = PolicyEvaluator::rbac().evaluate(
        &blog_policy(),
        &editor("alice"),
        &Resource::new("post:456"),
        &Action::new("edit"),
        None,
    );
    assert_eq!(effect, Effect::Allow);
}

#[test]
fn test_archived_post_deny_overrides() {
    init_tracing();
    let decision = PolicyEvaluator::rbac().explain(
        &blog_policy(),
        &editor("alice"),
        &Resource::new("post:archived:1"),
        &Action::new("edit"),
        None,
    );

    assert_eq!(decision.effect, Effect::Deny);
    assert_eq!(decision.matched_rules, vec![0, 1]);
    assert_eq!(decision.deciding_rule, Some(1));
}

#[test]
fn test_non_editor_is_implicitly_denied() {
    let decision = PolicyEvaluator::rbac().explain(
        &blog_policy(),
        &Subject::new("mallory").with_roles(["viewer"]),
        &Resource::new("post:456"),
        &Action::new("edit"),
        None,
    );
    assert!(decision.is_implicit_deny());
}

#[test]
fn test_domain_roles() {
    let policy = Policy::new(vec![PolicyRule::allow("role:admin", "billing:*", "manage")]);
    let subject = Subject::new("alice").with_attribute("domain_roles", json!({"acme": ["admin"], "globex": ["viewer"]}));
    let resource = Resource::new("billing:invoices");
    let action = Action::new("manage");
    let engine = PolicyEvaluator::rbac();

    assert_eq!(engine.evaluate(&policy, &subject, &resource, &action, Some(&Domain::new("acme"))), Effect::Allow);
    assert_eq!(engine.evaluate(&policy, &subject, &resource, &action, Some(&Domain::new("globex"))), Effect::Deny);
    assert_eq!(engine.evaluate(&policy, &subject, &resource, &action, None), Effect::Deny);
}

// ============================================================================
// ABAC
// ============================================================================

#[test]
fn test_author_may_edit_own_article() {
    init_tracing();
    let policy = Policy::new(vec![
        PolicyRule::allow("resource.author_id == subject.id", "article:*", "edit").with_priority(1),
    ]);
    let engine = evaluator(AuthorizationModel::Abac);
    let subject = Subject::new("123").with_attribute("id", 123);
    let edit = Action::new("edit");

    let own = Resource::new("article:1").with_attribute("author_id", 123);
    let foreign = Resource::new("article:2").with_attribute("author_id", 124);

    assert_eq!(engine.evaluate(&policy, &subject, &own, &edit, None), Effect::Allow);
    assert_eq!(engine.evaluate(&policy, &subject, &foreign, &edit, None), Effect::Deny);
}

#[test]
fn test_malformed_abac_rule_is_skipped() {
    init_tracing();
    let policy = Policy::new(vec![
        PolicyRule::allow("subject.level >= ", "*", "read"),
        PolicyRule::allow("subject.level >= 3", "*", "read"),
    ]);
    let engine = evaluator(AuthorizationModel::Abac);
    let decision = engine.explain(
        &policy,
        &Subject::new("u").with_attribute("level", 5),
        &Resource::new("doc:1"),
        &Action::new("read"),
        None,
    );

    assert!(decision.is_allowed());
    assert_eq!(decision.matched_rules, vec![1]);
}

// ============================================================================
// RESTful
// ============================================================================

#[test]
fn test_restful_routes() {
    let policy = Policy::new(vec![
        PolicyRule::allow("*", "/api/users/:id", "GET"),
        PolicyRule::allow("role:admin", "/api/admin/*", "POST"),
    ]);
    let engine = evaluator(AuthorizationModel::Restful);
    let anyone = Subject::new("anyone");

    assert_eq!(
        engine.evaluate(&policy, &anyone, &Resource::new("/api/users/42?expand=true"), &Action::new("GET"), None),
        Effect::Allow
    );
    assert_eq!(
        engine.evaluate(&policy, &anyone, &Resource::new("/api/users/42/posts"), &Action::new("GET"), None),
        Effect::Deny
    );
    assert_eq!(
        engine.evaluate(&policy, &anyone, &Resource::new("/api/users/42"), &Action::new("get"), None),
        Effect::Deny
    );
}

#[test]
fn test_composite_accepts_any_model() {
    let policy = Policy::new(vec![
        PolicyRule::allow("role:auditor", "ledger:*", "read"),
        PolicyRule::allow("subject.department == 'finance'", "ledger:*", "read"),
    ]);
    let engine = evaluator(AuthorizationModel::Composite(vec![AuthorizationModel::Rbac, AuthorizationModel::Abac]));
    let read = Action::new("read");
    let ledger = Resource::new("ledger:2024");

    assert_eq!(engine.evaluate(&policy, &Subject::new("a").with_roles(["auditor"]), &ledger, &read, None), Effect::Allow);
    assert_eq!(
        engine.evaluate(&policy, &Subject::new("b").with_attribute("department", "finance"), &ledger, &read, None),
        Effect::Allow
    );
    assert_eq!(engine.evaluate(&policy, &Subject::new("c"), &ledger, &read, None), Effect::Deny);
}

// ============================================================================
// Resolution and properties
// ============================================================================

#[test]
fn test_priority_resolution_from_config() {
    let engine = PolicyEvaluator::from_config(&EvaluatorConfig {
        model: AuthorizationModel::Rbac,
        strategy: ResolutionStrategy::Priority,
    });
    let edit = Action::new("edit");

    // The higher-ranked allow now beats the archived deny
    assert_eq!(
        engine.evaluate(&blog_policy(), &editor("alice"), &Resource::new("post:archived:1"), &edit, None),
        Effect::Allow
    );
}

#[test]
fn test_empty_policy_denies() {
    assert_eq!(
        PolicyEvaluator::rbac().evaluate(&Policy::empty(), &Subject::new("root"), &Resource::new("x"), &Action::new("y"), None),
        Effect::Deny
    );
}

#[test]
fn test_evaluation_does_not_mutate_policy() {
    let policy = blog_policy();
    let before = policy.clone();
    let engine = PolicyEvaluator::rbac();

    for _ in 0..3 {
        engine.evaluate(&policy, &editor("alice"), &Resource::new("post:archived:9"), &Action::new("edit"), None);
    }
    assert_eq!(policy, before);
}

#[tokio::test]
async fn test_records_through_repository() {
    init_tracing();
    let records: Vec<PolicyRecord> = serde_json::from_value(json!([
        {"subject": "role:editor", "resource": "post:*", "action": "edit", "effect": "Allow", "priority": 90},
        {"subject": "*", "resource": "page:*", "action": "edit", "effect": "Deny", "priority": 80}
    ]))
    .unwrap();

    let repo = InMemoryPolicyRepository::new();
    repo.add_records(records).await.unwrap();

    let subject = editor("alice");
    let resource = Resource::new("post:7");
    let policy = repo.get_policies_for(&subject, &resource).await.unwrap();
    assert_eq!(policy.len(), 1);
    assert_eq!(
        PolicyEvaluator::rbac().evaluate(&policy, &subject, &resource, &Action::new("edit"), None),
        Effect::Allow
    );

    let invalid: Vec<PolicyRecord> = serde_json::from_value(json!([
        {"subject": "bob", "resource": null, "action": "read", "effect": "Maybe", "priority": 1}
    ]))
    .unwrap();
    assert!(matches!(repo.add_records(invalid).await, Err(AuthzError::InvalidPolicy(_))));
    assert_eq!(repo.len().await, 2);
}

proptest! {
    #[test]
    fn prop_evaluation_is_idempotent(
        roles in proptest::collection::vec("[a-z]{1,6}", 0..4),
        post in "[a-z0-9:]{1,12}",
    ) {
        let engine = PolicyEvaluator::rbac();
        let policy = blog_policy();
        let subject = Subject::new("s").with_roles(roles);
        let resource = Resource::new(format!("post:{}", post));
        let action = Action::new("edit");

        let first = engine.explain(&policy, &subject, &resource, &action, None);
        let second = engine.explain(&policy, &subject, &resource, &action, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_owner_rule_matches_iff_equal(owner in 0i64..50, id in 0i64..50) {
        let policy = Policy::new(vec![PolicyRule::allow("resource.owner_id == subject.id", "*", "read")]);
        let engine = evaluator(AuthorizationModel::Abac);
        let subject = Subject::new(id.to_string());
        let resource = Resource::new("doc:1").with_attribute("owner_id", owner);

        let effect = engine.evaluate(&policy, &subject, &resource, &Action::new("read"), None);
        prop_assert_eq!(effect == Effect::Allow, owner == id);
    }
}
