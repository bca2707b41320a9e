//! Mutation check test suite (access management and the last-owner rule).

use super::fixtures::{
    documents, grant_on_ancestor, nested_document, owned_document, templates, template_grant,
    user_grant,
};
use crate::error::DomainError;
use crate::model::{DocumentRole, LinkReach, Principal, ResourceSnapshot, Subject, TemplateRole};
use crate::resolver::GrantMutation;

fn update(grant_id: &str, role: DocumentRole) -> GrantMutation<DocumentRole> {
    GrantMutation::Update {
        grant_id: grant_id.to_string(),
        role,
    }
}

fn delete(grant_id: &str) -> GrantMutation<DocumentRole> {
    GrantMutation::Delete {
        grant_id: grant_id.to_string(),
    }
}

fn create(subject: Subject, role: DocumentRole) -> GrantMutation<DocumentRole> {
    GrantMutation::Create { subject, role }
}

fn two_owners() -> ResourceSnapshot<DocumentRole> {
    owned_document().with_grant(user_grant("g-bob", "doc", "bob", DocumentRole::Owner))
}

// ========== Section 1: Last-Owner Guard ==========

#[test]
fn test_deleting_the_only_owner_is_rejected() {
    let resolver = documents();
    let snapshot = owned_document();

    let err = resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &snapshot,
            &delete("g-alice"),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::LastOwner {
            resource_id: "doc".to_string()
        }
    );
}

#[test]
fn test_demoting_the_only_owner_is_rejected() {
    let resolver = documents();
    let err = resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &owned_document(),
            &update("g-alice", DocumentRole::Administrator),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::LastOwner { .. }));
}

#[test]
fn test_owner_may_demote_self_while_another_owner_exists() {
    let resolver = documents();
    let alice = Principal::authenticated("alice");
    let bob = Principal::authenticated("bob");

    let snapshot = two_owners();
    resolver
        .check_mutation_allowed(
            &alice,
            &snapshot,
            &update("g-alice", DocumentRole::Administrator),
        )
        .unwrap();

    // Apply the demotion, then bob becomes the last owner.
    let mut after = snapshot.clone();
    after.grants[0].role = DocumentRole::Administrator;

    let err = resolver
        .check_mutation_allowed(&bob, &after, &update("g-bob", DocumentRole::Administrator))
        .unwrap_err();
    assert!(matches!(err, DomainError::LastOwner { .. }));
}

#[test]
fn test_owner_may_remove_another_owner_when_two_exist() {
    let resolver = documents();
    resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &two_owners(),
            &delete("g-bob"),
        )
        .unwrap();
}

#[test]
fn test_inherited_ownership_does_not_count_as_an_owner() {
    let resolver = documents();
    // alice owns the root; the child has a single direct owner (bob).
    let snapshot = grant_on_ancestor(
        nested_document(),
        0,
        user_grant("g-root", "root", "alice", DocumentRole::Owner),
    )
    .with_grant(user_grant("g-bob", "doc", "bob", DocumentRole::Owner));

    let err = resolver
        .check_mutation_allowed(&Principal::authenticated("alice"), &snapshot, &delete("g-bob"))
        .unwrap_err();
    assert!(matches!(err, DomainError::LastOwner { .. }));
}

#[test]
fn test_inherited_owner_may_manage_child_grants() {
    let resolver = documents();
    let snapshot = grant_on_ancestor(
        nested_document(),
        0,
        user_grant("g-root", "root", "alice", DocumentRole::Owner),
    );

    resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &snapshot,
            &create(Subject::user("bob"), DocumentRole::Owner),
        )
        .unwrap();
}

// ========== Section 2: Role Requirements ==========

#[test]
fn test_editor_cannot_manage_accesses() {
    let resolver = documents();
    let snapshot =
        owned_document().with_grant(user_grant("g-bob", "doc", "bob", DocumentRole::Editor));

    let err = resolver
        .check_mutation_allowed(
            &Principal::authenticated("bob"),
            &snapshot,
            &create(Subject::user("carol"), DocumentRole::Reader),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientRole {
            resource_id: "doc".to_string(),
            required: "administrator".to_string(),
        }
    );
}

#[test]
fn test_anonymous_cannot_manage_accesses_even_with_public_link() {
    let resolver = documents();
    let snapshot = owned_document().with_link(LinkReach::Public, DocumentRole::Editor);

    let err = resolver
        .check_mutation_allowed(
            &Principal::Anonymous,
            &snapshot,
            &create(Subject::user("carol"), DocumentRole::Reader),
        )
        .unwrap_err();
    assert!(err.is_forbidden());
}

#[test]
fn test_administrator_manages_up_to_administrator() {
    let resolver = documents();
    let snapshot = owned_document()
        .with_grant(user_grant("g-bob", "doc", "bob", DocumentRole::Administrator))
        .with_grant(user_grant("g-carol", "doc", "carol", DocumentRole::Administrator));
    let bob = Principal::authenticated("bob");

    resolver
        .check_mutation_allowed(
            &bob,
            &snapshot,
            &create(Subject::team("legal"), DocumentRole::Administrator),
        )
        .unwrap();
    resolver
        .check_mutation_allowed(&bob, &snapshot, &update("g-carol", DocumentRole::Reader))
        .unwrap();
    resolver
        .check_mutation_allowed(&bob, &snapshot, &delete("g-carol"))
        .unwrap();
}

#[test]
fn test_administrator_cannot_promote_to_owner() {
    let resolver = documents();
    let snapshot = owned_document()
        .with_grant(user_grant("g-bob", "doc", "bob", DocumentRole::Administrator))
        .with_grant(user_grant("g-carol", "doc", "carol", DocumentRole::Editor));
    let bob = Principal::authenticated("bob");

    for mutation in [
        update("g-carol", DocumentRole::Owner),
        update("g-bob", DocumentRole::Owner),
        create(Subject::user("dave"), DocumentRole::Owner),
    ] {
        let err = resolver
            .check_mutation_allowed(&bob, &snapshot, &mutation)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientRole {
                resource_id: "doc".to_string(),
                required: "owner".to_string(),
            }
        );
    }
}

#[test]
fn test_administrator_cannot_demote_or_remove_an_owner() {
    let resolver = documents();
    let snapshot = two_owners().with_grant(user_grant(
        "g-carol",
        "doc",
        "carol",
        DocumentRole::Administrator,
    ));
    let carol = Principal::authenticated("carol");

    for mutation in [update("g-bob", DocumentRole::Editor), delete("g-alice")] {
        let err = resolver
            .check_mutation_allowed(&carol, &snapshot, &mutation)
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientRole { .. }));
    }
}

#[test]
fn test_insufficient_role_is_reported_before_last_owner() {
    let resolver = documents();
    let snapshot = owned_document().with_grant(user_grant(
        "g-carol",
        "doc",
        "carol",
        DocumentRole::Administrator,
    ));

    let err = resolver
        .check_mutation_allowed(&Principal::authenticated("carol"), &snapshot, &delete("g-alice"))
        .unwrap_err();
    assert!(matches!(err, DomainError::InsufficientRole { .. }));
}

#[test]
fn test_updating_an_owner_to_owner_is_a_no_op() {
    let resolver = documents();
    resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &owned_document(),
            &update("g-alice", DocumentRole::Owner),
        )
        .unwrap();
}

// ========== Section 3: Targets ==========

#[test]
fn test_unknown_target_grant_is_not_found() {
    let resolver = documents();
    let err = resolver
        .check_mutation_allowed(
            &Principal::authenticated("alice"),
            &owned_document(),
            &delete("g-missing"),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::GrantNotFound {
            resource_id: "doc".to_string(),
            grant_id: "g-missing".to_string(),
        }
    );
}

#[test]
fn test_ancestor_grants_cannot_be_targeted_from_child() {
    let resolver = documents();
    let snapshot = grant_on_ancestor(
        nested_document(),
        0,
        user_grant("g-root", "root", "alice", DocumentRole::Owner),
    );

    let err = resolver
        .check_mutation_allowed(&Principal::authenticated("alice"), &snapshot, &delete("g-root"))
        .unwrap_err();
    assert!(matches!(err, DomainError::GrantNotFound { .. }));
}

// ========== Section 4: Templates ==========

#[test]
fn test_template_last_owner_guard() {
    let resolver = templates();
    let snapshot = ResourceSnapshot::template("tpl")
        .with_grant(template_grant("g1", "tpl", "alice", TemplateRole::Owner))
        .with_grant(template_grant("g2", "tpl", "bob", TemplateRole::Member));
    let alice = Principal::authenticated("alice");

    let err = resolver
        .check_mutation_allowed(
            &alice,
            &snapshot,
            &GrantMutation::Update {
                grant_id: "g1".to_string(),
                role: TemplateRole::Member,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::LastOwner { .. }));

    resolver
        .check_mutation_allowed(
            &alice,
            &snapshot,
            &GrantMutation::Update {
                grant_id: "g2".to_string(),
                role: TemplateRole::Owner,
            },
        )
        .unwrap();
}
