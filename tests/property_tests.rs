//! Property tests for authorization decisions.
//!
//! Each case builds its own single-threaded runtime, signs a principal in
//! through the fake provider and checks the settled decision.

mod common;

use common::{principal, Harness};
use portal_gate::{AllowedRoles, GateConfig, Outcome, Role, RouteTable, SessionEvent};
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds")
        .block_on(future)
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn arb_allowed() -> impl Strategy<Value = AllowedRoles> {
    prop::sample::subsequence(Role::ALL.to_vec(), 1..=4)
        .prop_map(|roles| AllowedRoles::new(roles).expect("subsequence is non-empty"))
}

fn arb_resource() -> impl Strategy<Value = String> {
    prop::string::string_regex("/[a-z]{1,8}(/[A-Za-z0-9 &?=%-]{0,12}){0,3}").unwrap()
}

proptest! {
    /// A settled principal with role R gets `granted` exactly when R is in
    /// the allowed set and `denied-forbidden` otherwise.
    #[test]
    fn proptest_decision_follows_role_membership(
        role in arb_role(),
        allowed in arb_allowed(),
        resource in arb_resource(),
    ) {
        let h = Harness::new();
        block_on(h.gate.dispatch(SessionEvent::SignedIn(principal("pupil-7", Some(role)))));

        let decision = h.gate.authorize(&resource, &allowed);
        if allowed.contains(role) {
            prop_assert_eq!(decision.outcome(), Outcome::Granted);
            let grant = decision.grant().expect("granted decision carries a grant");
            prop_assert_eq!(grant.role(), role);
            prop_assert_eq!(grant.resource(), resource.as_str());
            prop_assert!(decision.redirect().is_none());
        } else {
            prop_assert_eq!(decision.outcome(), Outcome::DeniedForbidden);
            prop_assert_eq!(decision.redirect(), Some("/unauthorized"));
            prop_assert!(decision.grant().is_none());
        }
    }

    /// Without a principal every protected resource is denied as
    /// unauthenticated, and the redirect leads back to the resource.
    #[test]
    fn proptest_signed_out_is_unauthenticated(
        allowed in arb_allowed(),
        resource in arb_resource(),
    ) {
        let h = Harness::new();
        block_on(h.gate.dispatch(SessionEvent::SignedOut));

        let decision = h.gate.authorize(&resource, &allowed);
        prop_assert_eq!(decision.outcome(), Outcome::DeniedUnauthenticated);
        prop_assert_eq!(decision.requested_resource(), resource.as_str());

        let redirect = decision.redirect().expect("denials carry a redirect");
        let encoded = redirect
            .strip_prefix("/login?from=")
            .expect("redirect targets the sign-in route");
        let decoded = urlencoding::decode(encoded).expect("redirect is valid UTF-8");
        prop_assert_eq!(decoded.as_ref(), resource.as_str());
    }

    /// The roleless principal is never granted, whatever the allowed set.
    #[test]
    fn proptest_roleless_principal_is_never_granted(
        allowed in arb_allowed(),
        resource in arb_resource(),
    ) {
        let h = Harness::new();
        block_on(h.gate.dispatch(SessionEvent::SignedIn(principal("new-hire", None))));

        let decision = h.gate.authorize(&resource, &allowed);
        prop_assert_eq!(decision.outcome(), Outcome::DeniedForbidden);
    }

    /// Sub-paths, query strings and fragments of a protected area map to
    /// that area; sibling names sharing a prefix do not.
    #[test]
    fn proptest_route_lookup_matches_whole_segments(
        area in prop::sample::select(vec!["/dashboard", "/teacher", "/student"]),
        rest in prop::string::string_regex("(/[a-z0-9]{1,6}){0,3}").unwrap(),
        suffix in prop::string::string_regex("[a-z]{1,4}").unwrap(),
        tail in prop::sample::select(vec!["", "?tab=grades", "#top"]),
    ) {
        let routes = RouteTable::from_config(&GateConfig::default()).unwrap();
        let expected = routes.lookup(area).cloned();
        prop_assert!(expected.is_some());

        let inside = format!("{}{}{}", area, rest, tail);
        prop_assert_eq!(routes.lookup(&inside).cloned(), expected);

        let sibling = format!("{}{}", area, suffix);
        prop_assert!(routes.lookup(&sibling).is_none());
    }
}
