//! Laws the type model must satisfy: smart-constructor canonicalization
//! and the algebra of the subtype relation.

use crate::aliases::TypeAliasRegistry;
use crate::subtype::{DeclTable, SubtypeChecker};
use trb_common::Span;
use trb_parser::ir::types::{TypeExpr, TypeLit, intersection_of, optional_of, union_of};

fn named(name: &str) -> TypeExpr {
    TypeExpr::named(name, Span::dummy())
}

fn union(members: Vec<TypeExpr>) -> TypeExpr {
    union_of(members, Span::dummy())
}

fn intersection(members: Vec<TypeExpr>) -> TypeExpr {
    intersection_of(members, Span::dummy())
}

// =============================================================================
// Union / intersection canonicalization
// =============================================================================

#[test]
fn union_deduplicates_members() {
    assert_eq!(
        union(vec![named("A"), named("B"), named("A")]),
        union(vec![named("A"), named("B")])
    );
}

#[test]
fn union_is_commutative_after_canonicalization() {
    assert_eq!(
        union(vec![named("A"), named("B")]),
        union(vec![named("B"), named("A")])
    );
}

#[test]
fn singleton_union_collapses() {
    assert_eq!(union(vec![named("A")]), named("A"));
    assert_eq!(union(vec![named("A"), named("A")]), named("A"));
}

#[test]
fn nested_unions_flatten() {
    let inner = union(vec![named("A"), named("B")]);
    let outer = union(vec![inner, named("C")]);
    let TypeExpr::Union { members, .. } = outer else {
        panic!("expected a union");
    };
    assert_eq!(members.len(), 3);
}

#[test]
fn union_drops_never_members() {
    assert_eq!(union(vec![named("A"), named("never")]), named("A"));
    assert_eq!(union(vec![named("never")]), named("never"));
}

#[test]
fn intersection_with_never_is_never() {
    assert_eq!(
        intersection(vec![named("A"), named("never")]),
        named("never")
    );
}

#[test]
fn intersection_with_any_is_the_other_member() {
    assert_eq!(intersection(vec![named("A"), named("any")]), named("A"));
}

#[test]
fn intersection_flattens_and_deduplicates() {
    let inner = intersection(vec![named("A"), named("B")]);
    let outer = intersection(vec![inner, named("A"), named("C")]);
    let TypeExpr::Intersection { members, .. } = outer else {
        panic!("expected an intersection");
    };
    assert_eq!(members.len(), 3);
}

// =============================================================================
// Optional normalization
// =============================================================================

#[test]
fn optional_is_union_with_nil() {
    let ty = optional_of(named("String"), Span::dummy());
    assert_eq!(ty, union(vec![named("String"), named("nil")]));
}

#[test]
fn optional_of_optional_collapses() {
    let once = optional_of(named("String"), Span::dummy());
    let twice = optional_of(once.clone(), Span::dummy());
    assert_eq!(once, twice);
}

#[test]
fn optional_nil_is_nil() {
    assert_eq!(optional_of(named("nil"), Span::dummy()), named("nil"));
}

// =============================================================================
// Subtype laws
// =============================================================================

fn empty_checker_holds(f: impl Fn(&SubtypeChecker<'_, '_>)) {
    let table = DeclTable::default();
    let aliases = TypeAliasRegistry::new();
    let checker = SubtypeChecker::new(&table, &aliases);
    f(&checker);
}

#[test]
fn reflexivity() {
    empty_checker_holds(|checker| {
        for name in ["String", "Integer", "bool", "nil", "any", "never"] {
            assert!(
                checker.is_subtype(&named(name), &named(name)),
                "reflexivity failed for {name}"
            );
        }
    });
}

#[test]
fn any_is_top_and_never_is_bottom() {
    empty_checker_holds(|checker| {
        assert!(checker.is_subtype(&named("String"), &named("any")));
        assert!(checker.is_subtype(&named("never"), &named("String")));
    });
}

#[test]
fn member_is_subtype_of_union() {
    empty_checker_holds(|checker| {
        let string_or_nil = union(vec![named("String"), named("nil")]);
        assert!(checker.is_subtype(&named("String"), &string_or_nil));
        assert!(checker.is_subtype(&named("nil"), &string_or_nil));
        assert!(!checker.is_subtype(&named("Integer"), &string_or_nil));
    });
}

#[test]
fn union_is_subtype_when_all_members_are() {
    empty_checker_holds(|checker| {
        let small = union(vec![named("String"), named("Integer")]);
        let big = union(vec![named("String"), named("Integer"), named("nil")]);
        assert!(checker.is_subtype(&small, &big));
        assert!(!checker.is_subtype(&big, &small));
    });
}

#[test]
fn intersection_subtype_rules() {
    empty_checker_holds(|checker| {
        let both = intersection(vec![named("Comparable"), named("Enumerable")]);
        // Intersection(Ts) <: U iff some Ti <: U.
        assert!(checker.is_subtype(&both, &named("Comparable")));
        // T <: Intersection(Us) iff T <: Ui for all i.
        assert!(!checker.is_subtype(&named("Comparable"), &both));
    });
}

#[test]
fn literal_widens_to_base_type() {
    empty_checker_holds(|checker| {
        let active = TypeExpr::Literal {
            value: TypeLit::Str("active".to_string()),
            span: Span::dummy(),
        };
        assert!(checker.is_subtype(&active, &named("String")));
        assert!(!checker.is_subtype(&named("String"), &active));
    });
}

#[test]
fn function_types_are_contravariant_in_params() {
    empty_checker_holds(|checker| {
        let accepts_optional = TypeExpr::Function {
            params: vec![union(vec![named("String"), named("nil")])],
            ret: Box::new(named("Integer")),
            span: Span::dummy(),
        };
        let accepts_string = TypeExpr::Function {
            params: vec![named("String")],
            ret: Box::new(named("Integer")),
            span: Span::dummy(),
        };
        // A function accepting more is usable where less is expected.
        assert!(checker.is_subtype(&accepts_optional, &accepts_string));
        assert!(!checker.is_subtype(&accepts_string, &accepts_optional));
    });
}

#[test]
fn generic_arguments_are_covariant() {
    empty_checker_holds(|checker| {
        let array_string = TypeExpr::Named {
            name: "Array".to_string(),
            args: vec![named("String")],
            span: Span::dummy(),
        };
        let array_optional = TypeExpr::Named {
            name: "Array".to_string(),
            args: vec![union(vec![named("String"), named("nil")])],
            span: Span::dummy(),
        };
        assert!(checker.is_subtype(&array_string, &array_optional));
        assert!(!checker.is_subtype(&array_optional, &array_string));
    });
}

#[test]
fn alias_resolution_feeds_subtyping() {
    let table = DeclTable::default();
    let mut aliases = TypeAliasRegistry::new();
    aliases
        .register("UserId", Vec::new(), named("Integer"))
        .unwrap();
    let checker = SubtypeChecker::new(&table, &aliases);
    assert!(checker.is_subtype(&named("UserId"), &named("Integer")));
    assert!(checker.is_subtype(&named("Integer"), &named("UserId")));
}
