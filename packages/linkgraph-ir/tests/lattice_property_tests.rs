//! Property-based tests for the LinkNature lattice
//!
//! Laws that must hold for every pair of natures:
//! - reverse is an involution
//! - ∅ is the identity of combine, X absorbs
//! - composition mirrors under reverse
//! - best is the rank join
//! - identities restricted to call paths intersect their restrictions

use linkgraph_ir::features::linkage::{LinkKind, LinkNature};
use linkgraph_ir::shared::models::MethodRef;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn kind() -> impl Strategy<Value = LinkKind> {
    prop::sample::select(LinkKind::ALL.to_vec())
}

fn pass_through() -> impl Strategy<Value = BTreeSet<MethodRef>> {
    prop::collection::btree_set("a\\.C\\.[fgh]\\(\\)", 0..3)
        .prop_map(|ids| ids.into_iter().map(MethodRef::new).collect())
}

// Plain natures plus identities restricted to a few call paths
fn nature() -> impl Strategy<Value = LinkNature> {
    prop_oneof![
        4 => kind().prop_map(LinkNature::of),
        1 => pass_through().prop_map(LinkNature::identical_through),
    ]
}

proptest! {
    #[test]
    fn prop_reverse_is_involution(n in nature()) {
        prop_assert_eq!(n.reverse().reverse(), n.clone());
        prop_assert_eq!(n.reverse().rank(), n.rank());
    }

    #[test]
    fn prop_empty_is_identity(n in nature()) {
        prop_assert_eq!(LinkNature::EMPTY.combine(&n), n.clone());
        prop_assert_eq!(n.combine(&LinkNature::EMPTY), n);
    }

    #[test]
    fn prop_none_absorbs(n in nature()) {
        prop_assert_eq!(LinkNature::NONE.combine(&n), LinkNature::NONE);
        prop_assert_eq!(n.combine(&LinkNature::NONE), LinkNature::NONE);
    }

    #[test]
    fn prop_combine_mirrors_under_reverse(a in kind(), b in kind()) {
        let (a, b) = (LinkNature::of(a), LinkNature::of(b));
        prop_assert_eq!(
            a.combine(&b).reverse(),
            b.reverse().combine(&a.reverse()),
            "{} then {}", a, b
        );
    }

    #[test]
    fn prop_identity_is_neutral_for_valid_natures(k in kind()) {
        let n = LinkNature::of(k);
        prop_assume!(n.valid());
        prop_assert_eq!(LinkNature::IS_IDENTICAL_TO.combine(&n), n.clone());
        prop_assert_eq!(n.combine(&LinkNature::IS_IDENTICAL_TO), n);
    }

    #[test]
    fn prop_best_is_rank_join(a in nature(), b in nature()) {
        let best = a.best(&b);
        prop_assert_eq!(best.rank(), a.rank().max(b.rank()));
        prop_assert_eq!(best.best(&best), best.clone());
        prop_assert_eq!(a.best(&b).rank(), b.best(&a).rank());
    }

    #[test]
    fn prop_symbol_round_trip(k in kind()) {
        let n = LinkNature::of(k);
        let parsed = LinkNature::from_symbol(n.symbol());
        prop_assert_eq!(parsed.map(|p| p.kind()), Some(k));
    }

    #[test]
    fn prop_restricted_identities_intersect(a in pass_through(), b in pass_through()) {
        let combined = LinkNature::identical_through(a.clone())
            .combine(&LinkNature::identical_through(b.clone()));
        let expected: BTreeSet<MethodRef> = a.intersection(&b).cloned().collect();
        prop_assert!(combined.is_identical());
        prop_assert_eq!(combined.pass_through(), Some(&expected));
        prop_assert_eq!(combined.valid(), !expected.is_empty());
    }

    #[test]
    fn prop_redundant_natures_are_valid(n in nature(), up in kind(), down in kind()) {
        let (up, down) = (LinkNature::of(up), LinkNature::of(down));
        let all = n
            .redundant_from_up(&up)
            .into_iter()
            .chain(n.redundant_to_up(&down))
            .chain(n.redundant_up(&up, &down));
        for r in all {
            prop_assert!(r.valid(), "{} is not valid", r);
        }
    }
}
