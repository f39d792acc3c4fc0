//! LinkNature: the relation lattice
//!
//! A link `a R b` states how `b` can be reached (read or mutated) through `a`.
//! Natures are ranked; higher rank means more specific:
//!
//! ```text
//!  11  ≡  is-identical-to (optionally restricted to pass-through methods)
//!  10  ← → is-assigned-from / is-assigned-to
//!   9  ⊰ ⊱ is-decorated-with / contains-decoration
//!   8  ∈ ∋ is-element-of / contains-as-member
//!   7  ⊆ ⊇ is-subset-of / is-superset-of
//!   6  ~  shares-elements
//!   5  ≤ ≥ is-in-object-graph / object-graph-contains
//!   4  ∩  object-graph-overlaps
//!   3  ≈  shares-fields
//!   2  ≺ ≻ is-field-of / contains-as-field
//!  -1  ∅  empty, identity of combine
//!  -2  X  none, absorbing
//! ```
//!
//! `combine` is transitive composition. Every rule in the table also yields
//! its mirror image: from `a R1 b, b R2 c ⇒ a R3 c` follows
//! `c R2' b, b R1' a ⇒ c R3' a`, so the table only lists one side.

use crate::shared::models::MethodRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    None,
    Empty,
    IsFieldOf,
    ContainsAsField,
    SharesFields,
    ObjectGraphOverlaps,
    IsInObjectGraph,
    ObjectGraphContains,
    SharesElements,
    IsSubsetOf,
    IsSupersetOf,
    IsElementOf,
    ContainsAsMember,
    IsDecoratedWith,
    ContainsDecoration,
    IsAssignedFrom,
    IsAssignedTo,
    IsIdenticalTo,
}

impl LinkKind {
    pub const ALL: [LinkKind; 18] = [
        LinkKind::None,
        LinkKind::Empty,
        LinkKind::IsFieldOf,
        LinkKind::ContainsAsField,
        LinkKind::SharesFields,
        LinkKind::ObjectGraphOverlaps,
        LinkKind::IsInObjectGraph,
        LinkKind::ObjectGraphContains,
        LinkKind::SharesElements,
        LinkKind::IsSubsetOf,
        LinkKind::IsSupersetOf,
        LinkKind::IsElementOf,
        LinkKind::ContainsAsMember,
        LinkKind::IsDecoratedWith,
        LinkKind::ContainsDecoration,
        LinkKind::IsAssignedFrom,
        LinkKind::IsAssignedTo,
        LinkKind::IsIdenticalTo,
    ];

    pub fn rank(self) -> i32 {
        match self {
            LinkKind::None => -2,
            LinkKind::Empty => -1,
            LinkKind::IsFieldOf | LinkKind::ContainsAsField => 2,
            LinkKind::SharesFields => 3,
            LinkKind::ObjectGraphOverlaps => 4,
            LinkKind::IsInObjectGraph | LinkKind::ObjectGraphContains => 5,
            LinkKind::SharesElements => 6,
            LinkKind::IsSubsetOf | LinkKind::IsSupersetOf => 7,
            LinkKind::IsElementOf | LinkKind::ContainsAsMember => 8,
            LinkKind::IsDecoratedWith | LinkKind::ContainsDecoration => 9,
            LinkKind::IsAssignedFrom | LinkKind::IsAssignedTo => 10,
            LinkKind::IsIdenticalTo => 11,
        }
    }

    pub fn reverse(self) -> LinkKind {
        match self {
            LinkKind::IsFieldOf => LinkKind::ContainsAsField,
            LinkKind::ContainsAsField => LinkKind::IsFieldOf,
            LinkKind::IsInObjectGraph => LinkKind::ObjectGraphContains,
            LinkKind::ObjectGraphContains => LinkKind::IsInObjectGraph,
            LinkKind::IsSubsetOf => LinkKind::IsSupersetOf,
            LinkKind::IsSupersetOf => LinkKind::IsSubsetOf,
            LinkKind::IsElementOf => LinkKind::ContainsAsMember,
            LinkKind::ContainsAsMember => LinkKind::IsElementOf,
            LinkKind::IsDecoratedWith => LinkKind::ContainsDecoration,
            LinkKind::ContainsDecoration => LinkKind::IsDecoratedWith,
            LinkKind::IsAssignedFrom => LinkKind::IsAssignedTo,
            LinkKind::IsAssignedTo => LinkKind::IsAssignedFrom,
            symmetric => symmetric,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LinkKind::None => "X",
            LinkKind::Empty => "∅",
            LinkKind::IsFieldOf => "≺",
            LinkKind::ContainsAsField => "≻",
            LinkKind::SharesFields => "≈",
            LinkKind::ObjectGraphOverlaps => "∩",
            LinkKind::IsInObjectGraph => "≤",
            LinkKind::ObjectGraphContains => "≥",
            LinkKind::SharesElements => "~",
            LinkKind::IsSubsetOf => "⊆",
            LinkKind::IsSupersetOf => "⊇",
            LinkKind::IsElementOf => "∈",
            LinkKind::ContainsAsMember => "∋",
            LinkKind::IsDecoratedWith => "⊰",
            LinkKind::ContainsDecoration => "⊱",
            LinkKind::IsAssignedFrom => "←",
            LinkKind::IsAssignedTo => "→",
            LinkKind::IsIdenticalTo => "≡",
        }
    }

    /// Decorations compose like the field containment they imply
    fn structural(self) -> LinkKind {
        match self {
            LinkKind::IsDecoratedWith => LinkKind::ContainsAsField,
            LinkKind::ContainsDecoration => LinkKind::IsFieldOf,
            other => other,
        }
    }
}

/// Composition rules over the structural kinds; see the module docs for the mirror rule
fn compose_table(a: LinkKind, b: LinkKind) -> Option<LinkKind> {
    use LinkKind::*;
    let result = match (a, b) {
        (IsElementOf, IsSubsetOf) => IsElementOf,
        (IsElementOf, IsInObjectGraph | IsFieldOf | IsElementOf) => IsInObjectGraph,

        (IsFieldOf, IsElementOf | IsSubsetOf | IsInObjectGraph | IsFieldOf) => IsInObjectGraph,

        (IsSubsetOf, IsSubsetOf) => IsSubsetOf,
        (IsSubsetOf, IsElementOf | IsFieldOf | IsInObjectGraph) => IsInObjectGraph,

        (ContainsAsMember, IsElementOf) => SharesElements,
        (ContainsAsMember, IsFieldOf | IsSubsetOf | IsInObjectGraph) => ObjectGraphOverlaps,
        (
            ContainsAsMember,
            ContainsAsField | IsSupersetOf | ObjectGraphContains | ContainsAsMember,
        ) => ObjectGraphContains,

        (ContainsAsField, IsFieldOf) => SharesFields,
        (ContainsAsField, IsSubsetOf | IsElementOf | IsInObjectGraph) => ObjectGraphOverlaps,
        (
            ContainsAsField,
            ContainsAsMember | IsSupersetOf | ObjectGraphContains | ContainsAsField,
        ) => ObjectGraphContains,

        (IsSupersetOf, IsSupersetOf) => IsSupersetOf,
        (IsSupersetOf, ContainsAsField | ObjectGraphContains) => ObjectGraphContains,
        (IsSupersetOf, ContainsAsMember) => ContainsAsMember,
        (IsSupersetOf, SharesElements) => SharesElements,
        (
            IsSupersetOf,
            IsElementOf | IsFieldOf | IsSubsetOf | IsInObjectGraph | SharesFields,
        ) => ObjectGraphOverlaps,

        (IsInObjectGraph, IsElementOf | IsFieldOf | IsSubsetOf | IsInObjectGraph) => {
            IsInObjectGraph
        }

        (
            ObjectGraphContains,
            ContainsAsMember | IsSupersetOf | ContainsAsField | ObjectGraphContains,
        ) => ObjectGraphContains,
        (ObjectGraphContains, IsInObjectGraph | IsSubsetOf | IsElementOf | IsFieldOf) => {
            ObjectGraphOverlaps
        }

        (SharesElements, IsSubsetOf) => SharesElements,
        (SharesElements, IsElementOf | IsFieldOf | IsInObjectGraph) => ObjectGraphOverlaps,

        (SharesFields, IsElementOf | IsFieldOf | IsInObjectGraph) => ObjectGraphOverlaps,

        (ObjectGraphOverlaps, IsElementOf | IsFieldOf | IsInObjectGraph | IsSubsetOf) => {
            ObjectGraphOverlaps
        }

        _ => return Option::None,
    };
    Some(result)
}

/// Restriction of an identity to call paths through specific methods; `None` means unrestricted
pub type PassThrough = Option<Arc<BTreeSet<MethodRef>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkNature {
    kind: LinkKind,
    pass_through: PassThrough,
}

impl LinkNature {
    pub const NONE: LinkNature = LinkNature::of(LinkKind::None);
    pub const EMPTY: LinkNature = LinkNature::of(LinkKind::Empty);
    pub const IS_FIELD_OF: LinkNature = LinkNature::of(LinkKind::IsFieldOf);
    pub const CONTAINS_AS_FIELD: LinkNature = LinkNature::of(LinkKind::ContainsAsField);
    pub const SHARES_FIELDS: LinkNature = LinkNature::of(LinkKind::SharesFields);
    pub const OBJECT_GRAPH_OVERLAPS: LinkNature = LinkNature::of(LinkKind::ObjectGraphOverlaps);
    pub const IS_IN_OBJECT_GRAPH: LinkNature = LinkNature::of(LinkKind::IsInObjectGraph);
    pub const OBJECT_GRAPH_CONTAINS: LinkNature = LinkNature::of(LinkKind::ObjectGraphContains);
    pub const SHARES_ELEMENTS: LinkNature = LinkNature::of(LinkKind::SharesElements);
    pub const IS_SUBSET_OF: LinkNature = LinkNature::of(LinkKind::IsSubsetOf);
    pub const IS_SUPERSET_OF: LinkNature = LinkNature::of(LinkKind::IsSupersetOf);
    pub const IS_ELEMENT_OF: LinkNature = LinkNature::of(LinkKind::IsElementOf);
    pub const CONTAINS_AS_MEMBER: LinkNature = LinkNature::of(LinkKind::ContainsAsMember);
    pub const IS_DECORATED_WITH: LinkNature = LinkNature::of(LinkKind::IsDecoratedWith);
    pub const CONTAINS_DECORATION: LinkNature = LinkNature::of(LinkKind::ContainsDecoration);
    pub const IS_ASSIGNED_FROM: LinkNature = LinkNature::of(LinkKind::IsAssignedFrom);
    pub const IS_ASSIGNED_TO: LinkNature = LinkNature::of(LinkKind::IsAssignedTo);
    pub const IS_IDENTICAL_TO: LinkNature = LinkNature::of(LinkKind::IsIdenticalTo);

    pub const fn of(kind: LinkKind) -> Self {
        LinkNature {
            kind,
            pass_through: None,
        }
    }

    /// Identity that only holds through calls to `methods`
    pub fn identical_through(methods: BTreeSet<MethodRef>) -> Self {
        LinkNature {
            kind: LinkKind::IsIdenticalTo,
            pass_through: Some(Arc::new(methods)),
        }
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn pass_through(&self) -> Option<&BTreeSet<MethodRef>> {
        self.pass_through.as_deref()
    }

    pub fn rank(&self) -> i32 {
        self.kind.rank()
    }

    /// Rank at least 2, and not an identity restricted to no call path at all
    pub fn valid(&self) -> bool {
        self.rank() >= 2 && !self.pass_through().map_or(false, |p| p.is_empty())
    }

    pub fn reverse(&self) -> LinkNature {
        LinkNature {
            kind: self.kind.reverse(),
            pass_through: self.pass_through.clone(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.kind.symbol()
    }

    pub fn from_symbol(symbol: &str) -> Option<LinkNature> {
        LinkKind::ALL
            .iter()
            .find(|k| k.symbol() == symbol)
            .map(|k| LinkNature::of(*k))
    }

    pub fn is_identical(&self) -> bool {
        self.kind == LinkKind::IsIdenticalTo
    }

    /// Identity or assignment: the two sides hold the same object
    pub fn is_identical_or_assigned(&self) -> bool {
        matches!(
            self.kind,
            LinkKind::IsIdenticalTo | LinkKind::IsAssignedFrom | LinkKind::IsAssignedTo
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lattice operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Transitive composition: `a self b, b other c ⇒ a result c`
    pub fn combine(&self, other: &LinkNature) -> LinkNature {
        use LinkKind::*;
        match (self.kind, other.kind) {
            (None, _) | (_, None) => LinkNature::NONE,
            (Empty, _) => other.clone(),
            (_, Empty) => self.clone(),
            (IsIdenticalTo, IsIdenticalTo) => self.intersect(other),
            (IsIdenticalTo, _) => other.clone(),
            (_, IsIdenticalTo) => self.clone(),
            (IsAssignedFrom, IsAssignedFrom) => LinkNature::IS_ASSIGNED_FROM,
            (IsAssignedTo, IsAssignedTo) => LinkNature::IS_ASSIGNED_TO,
            // a holds b's value, c holds b's value
            (IsAssignedFrom, IsAssignedTo) => LinkNature::IS_IDENTICAL_TO,
            // b held a's value, and later (or elsewhere) c's value
            (IsAssignedTo, IsAssignedFrom) => LinkNature::NONE,
            (IsAssignedFrom | IsAssignedTo, _) => other.clone(),
            (_, IsAssignedFrom | IsAssignedTo) => self.clone(),
            (IsDecoratedWith, IsDecoratedWith) => LinkNature::IS_DECORATED_WITH,
            (ContainsDecoration, ContainsDecoration) => LinkNature::CONTAINS_DECORATION,
            (a, b) => {
                let (a, b) = (a.structural(), b.structural());
                compose_table(a, b)
                    .or_else(|| compose_table(b.reverse(), a.reverse()).map(LinkKind::reverse))
                    .map(LinkNature::of)
                    .unwrap_or(LinkNature::NONE)
            }
        }
    }

    fn intersect(&self, other: &LinkNature) -> LinkNature {
        match (&self.pass_through, &other.pass_through) {
            (None, _) => other.clone(),
            (_, None) => self.clone(),
            (Some(a), Some(b)) => {
                LinkNature::identical_through(a.intersection(b).cloned().collect())
            }
        }
    }

    /// Join by rank; ties keep `self`
    pub fn best(&self, other: &LinkNature) -> LinkNature {
        if other.rank() > self.rank() {
            other.clone()
        } else {
            self.clone()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Redundancy under field containment
    // ═══════════════════════════════════════════════════════════════════════

    /// Natures between the enclosing scope `s` of the source and the target that
    /// an edge `s.f self t` makes redundant; `up` is the nature `s up s.f`.
    pub fn redundant_from_up(&self, up: &LinkNature) -> Vec<LinkNature> {
        Self::valid_distinct([self.clone(), up.combine(self)])
    }

    /// Natures between the source and the enclosing scope `s` of the target;
    /// `down` is the nature `t.f down s`.
    pub fn redundant_to_up(&self, down: &LinkNature) -> Vec<LinkNature> {
        Self::valid_distinct([self.clone(), self.combine(down)])
    }

    /// Natures between the enclosing scopes of both sides
    pub fn redundant_up(&self, up: &LinkNature, down: &LinkNature) -> Vec<LinkNature> {
        Self::valid_distinct([self.clone(), up.combine(self).combine(down)])
    }

    fn valid_distinct<const N: usize>(candidates: [LinkNature; N]) -> Vec<LinkNature> {
        let mut result: Vec<LinkNature> = Vec::with_capacity(N);
        for c in candidates {
            if c.valid() && !result.contains(&c) {
                result.push(c);
            }
        }
        result
    }
}

impl fmt::Display for LinkNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
