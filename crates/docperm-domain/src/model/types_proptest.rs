//! Property-based tests for model types.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{AccessGrant, DocumentRole, Principal, Role, Subject};

    fn document_role_strategy() -> impl Strategy<Value = DocumentRole> {
        prop::sample::select(DocumentRole::ALL.to_vec())
    }

    /// Strategy to generate well-formed subjects
    fn subject_strategy() -> impl Strategy<Value = Subject> {
        prop_oneof![
            "[a-z]{1,12}".prop_map(Subject::User),
            "[a-z]{1,12}".prop_map(Subject::Team),
        ]
    }

    proptest! {
        #[test]
        fn test_constructed_grants_are_always_valid(
            subject in subject_strategy(),
            role in document_role_strategy()
        ) {
            let grant = AccessGrant::new("g", "doc", subject.clone(), role);
            let parsed = grant.subject();
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.unwrap().to_subject(), subject);
        }

        #[test]
        fn test_grants_with_both_subjects_are_invalid(
            user in "[a-z]{1,12}",
            team in "[a-z]{1,12}",
            role in document_role_strategy()
        ) {
            let mut grant = AccessGrant::new("g", "doc", Subject::User(user), role);
            grant.team = Some(team);
            prop_assert!(grant.subject().is_err());
        }

        #[test]
        fn test_role_order_matches_lattice_position(
            a in document_role_strategy(),
            b in document_role_strategy()
        ) {
            let pos = |r: DocumentRole| DocumentRole::ALL.iter().position(|x| *x == r).unwrap();
            prop_assert_eq!(a.cmp(&b), pos(a).cmp(&pos(b)));
        }

        #[test]
        fn test_user_grant_matches_exactly_its_user(
            owner in "[a-z]{1,8}",
            caller in "[a-z]{1,8}",
            role in document_role_strategy()
        ) {
            let grant = AccessGrant::new("g", "doc", Subject::user(owner.clone()), role);
            let matches = grant.subject().unwrap().matches(&Principal::authenticated(caller.clone()));
            prop_assert_eq!(matches, owner == caller);
        }
    }
}
