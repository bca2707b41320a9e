//! Property-based tests for the resolver invariants.

use proptest::prelude::*;

use super::fixtures::{documents, user_grant};
use crate::error::DomainError;
use crate::model::{
    AccessGrant, AncestorSnapshot, DocumentRole, LinkReach, Principal, ResourceSnapshot, Role,
    Subject,
};
use crate::resolver::GrantMutation;

const DEPTH: usize = 3;
const USERS: [&str; 2] = ["alice", "bob"];
const TEAMS: [&str; 2] = ["legal", "ops"];

/// A grant placed somewhere in a `DEPTH`-ancestor tree.
#[derive(Debug, Clone)]
struct GrantPlan {
    /// 0..DEPTH are ancestors (root first), DEPTH is the resource itself.
    level: usize,
    team: bool,
    name: usize,
    role: DocumentRole,
}

fn role_strategy() -> impl Strategy<Value = DocumentRole> {
    prop::sample::select(DocumentRole::ALL.to_vec())
}

fn link_strategy() -> impl Strategy<Value = Option<(LinkReach, DocumentRole)>> {
    prop::option::of((
        prop::sample::select(vec![
            LinkReach::Restricted,
            LinkReach::Authenticated,
            LinkReach::Public,
        ]),
        prop::sample::select(DocumentRole::LINK_ROLES.to_vec()),
    ))
}

fn grant_plan_strategy() -> impl Strategy<Value = GrantPlan> {
    (0..=DEPTH, any::<bool>(), 0..2usize, role_strategy()).prop_map(|(level, team, name, role)| {
        GrantPlan {
            level,
            team,
            name,
            role,
        }
    })
}

fn principal_strategy() -> impl Strategy<Value = Principal> {
    prop_oneof![
        Just(Principal::Anonymous),
        Just(Principal::authenticated("alice")),
        Just(Principal::with_teams("alice", ["legal"])),
        Just(Principal::with_teams("bob", ["legal", "ops"])),
    ]
}

fn build(
    plans: &[GrantPlan],
    link: Option<(LinkReach, DocumentRole)>,
) -> ResourceSnapshot<DocumentRole> {
    let mut snapshot = ResourceSnapshot::document("doc");
    for level in 0..DEPTH {
        snapshot = snapshot.with_ancestor(AncestorSnapshot::new(format!("a{level}")));
    }
    if let Some((reach, role)) = link {
        snapshot = snapshot.with_link(reach, role);
    }

    for (index, plan) in plans.iter().enumerate() {
        let resource_id = if plan.level == DEPTH {
            "doc".to_string()
        } else {
            format!("a{}", plan.level)
        };
        let subject = if plan.team {
            Subject::team(TEAMS[plan.name])
        } else {
            Subject::user(USERS[plan.name])
        };
        let grant = AccessGrant::new(format!("g{index}"), resource_id, subject, plan.role);
        if plan.level == DEPTH {
            snapshot.grants.push(grant);
        } else {
            snapshot.ancestors[plan.level].grants.push(grant);
        }
    }
    snapshot
}

proptest! {
    #[test]
    fn test_adding_grants_never_lowers_the_role(
        base in prop::collection::vec(grant_plan_strategy(), 0..6),
        extra in prop::collection::vec(grant_plan_strategy(), 0..4),
        link in link_strategy(),
        principal in principal_strategy()
    ) {
        let resolver = documents();
        let before = resolver.resolve_role(&principal, &build(&base, link)).unwrap();

        let mut widened = base.clone();
        widened.extend(extra);
        let after = resolver.resolve_role(&principal, &build(&widened, link)).unwrap();

        prop_assert!(before <= after, "{:?} > {:?}", before, after);
    }

    #[test]
    fn test_ancestor_grant_is_never_diminished(
        level in 0..DEPTH,
        role in role_strategy(),
        own in prop::option::of(role_strategy())
    ) {
        let resolver = documents();
        let mut plans = vec![GrantPlan { level, team: false, name: 0, role }];
        if let Some(own) = own {
            plans.push(GrantPlan { level: DEPTH, team: false, name: 0, role: own });
        }

        let resolved = resolver
            .resolve_role(&Principal::authenticated("alice"), &build(&plans, None))
            .unwrap();
        prop_assert_eq!(resolved, Some(own.map_or(role, |own| own.max(role))));
    }

    #[test]
    fn test_resolution_is_pure(
        plans in prop::collection::vec(grant_plan_strategy(), 0..8),
        link in link_strategy(),
        principal in principal_strategy()
    ) {
        let resolver = documents();
        let snapshot = build(&plans, link);
        let first = resolver.resolve(&principal, &snapshot).unwrap();
        let second = resolver.resolve(&principal, &snapshot).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_link_reach_policy(
        reach in prop::sample::select(vec![
            LinkReach::Restricted,
            LinkReach::Authenticated,
            LinkReach::Public,
        ]),
        role in prop::sample::select(DocumentRole::LINK_ROLES.to_vec()),
        principal in principal_strategy()
    ) {
        let resolver = documents();
        let snapshot = build(&[], Some((reach, role)));
        let resolved = resolver.resolve_role(&principal, &snapshot).unwrap();

        let expected = match reach {
            LinkReach::Restricted => None,
            LinkReach::Authenticated if principal.is_authenticated() => Some(role),
            LinkReach::Authenticated => None,
            LinkReach::Public => Some(role),
        };
        prop_assert_eq!(resolved, expected);
    }

    #[test]
    fn test_owner_removal_allowed_iff_another_owner_remains(
        owners in 1..4usize,
        target in 0..4usize,
        delete in any::<bool>(),
        new_role in prop::sample::select(vec![
            DocumentRole::Reader,
            DocumentRole::Editor,
            DocumentRole::Administrator,
        ])
    ) {
        let resolver = documents();
        let target = target % owners;
        let mut snapshot = ResourceSnapshot::document("doc");
        for index in 0..owners {
            snapshot = snapshot.with_grant(user_grant(
                &format!("g{index}"),
                "doc",
                &format!("u{index}"),
                DocumentRole::Owner,
            ));
        }
        let mutation = if delete {
            GrantMutation::Delete { grant_id: format!("g{target}") }
        } else {
            GrantMutation::Update { grant_id: format!("g{target}"), role: new_role }
        };

        let result = resolver.check_mutation_allowed(
            &Principal::authenticated("u0"),
            &snapshot,
            &mutation,
        );
        if owners > 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(DomainError::LastOwner { resource_id: "doc".to_string() }));
        }
    }
}
