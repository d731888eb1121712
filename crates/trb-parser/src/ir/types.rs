//! Type expressions and their smart constructors.
//!
//! Type expressions are unique up to structural equality: spans never take
//! part in comparison, hashing or ordering. The smart constructors
//! [`union_of`] and [`intersection_of`] normalize on construction (flatten,
//! dedupe, sort into canonical order, collapse singletons), so structurally
//! equal types compare equal no matter how they were written.

use std::cmp::Ordering;
use trb_common::Span;

/// Canonical spelling of the boolean type. `Bool` and `Boolean` in source
/// both resolve here; the RBS emitter prints `bool`.
pub const BOOL: &str = "bool";
/// Canonical spelling of the dynamic type. `untyped` in source resolves here.
pub const ANY: &str = "any";

/// Literal types (`"active"`, `42`, `:draft`, `true`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeLit {
    Str(String),
    Int(i64),
    Bool(bool),
    Symbol(String),
}

impl TypeLit {
    /// The base type this literal widens to.
    #[must_use]
    pub fn base_type_name(&self) -> &'static str {
        match self {
            TypeLit::Str(_) => "String",
            TypeLit::Int(_) => "Integer",
            TypeLit::Bool(_) => BOOL,
            TypeLit::Symbol(_) => "Symbol",
        }
    }
}

impl std::fmt::Display for TypeLit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeLit::Str(s) => write!(f, "\"{s}\""),
            TypeLit::Int(i) => write!(f, "{i}"),
            TypeLit::Bool(b) => write!(f, "{b}"),
            TypeLit::Symbol(s) => write!(f, ":{s}"),
        }
    }
}

/// A type expression.
///
/// `Optional(T)` has no variant of its own: it is normalized to
/// `Union(T, nil)` on construction (see [`optional_of`]).
#[derive(Clone, Debug)]
pub enum TypeExpr {
    /// A named type, possibly with type arguments: `String`, `Array<T>`.
    Named {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// `A | B | C`, flattened and deduplicated, always >= 2 members.
    Union { members: Vec<TypeExpr>, span: Span },
    /// `A & B`, flattened and deduplicated, always >= 2 members.
    Intersection { members: Vec<TypeExpr>, span: Span },
    /// Reference to a generic parameter of the enclosing declaration.
    TypeVar { name: String, span: Span },
    /// A literal type: `"active"`, `1`, `:draft`, `false`.
    Literal { value: TypeLit, span: Span },
    /// A function type: `(T1, T2) -> R`.
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        span: Span,
    },
    /// The `self` type.
    SelfType { span: Span },
}

impl TypeExpr {
    /// Build a named type with no arguments.
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: Vec::new(),
            span,
        }
    }

    /// The builtin `nil` type.
    #[must_use]
    pub fn nil(span: Span) -> Self {
        TypeExpr::named("nil", span)
    }

    /// The builtin `any` type.
    #[must_use]
    pub fn any(span: Span) -> Self {
        TypeExpr::named(ANY, span)
    }

    /// The builtin `void` type.
    #[must_use]
    pub fn void(span: Span) -> Self {
        TypeExpr::named("void", span)
    }

    /// The builtin `never` type.
    #[must_use]
    pub fn never(span: Span) -> Self {
        TypeExpr::named("never", span)
    }

    /// The builtin `bool` type.
    #[must_use]
    pub fn bool(span: Span) -> Self {
        TypeExpr::named(BOOL, span)
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Union { span, .. }
            | TypeExpr::Intersection { span, .. }
            | TypeExpr::TypeVar { span, .. }
            | TypeExpr::Literal { span, .. }
            | TypeExpr::Function { span, .. }
            | TypeExpr::SelfType { span } => *span,
        }
    }

    /// Is this a named type with the given name and no arguments?
    #[must_use]
    pub fn is_named(&self, expected: &str) -> bool {
        matches!(self, TypeExpr::Named { name, args, .. } if name == expected && args.is_empty())
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        self.is_named(ANY)
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.is_named("nil")
    }

    #[must_use]
    pub fn is_never(&self) -> bool {
        self.is_named("never")
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.is_named("void")
    }

    /// Whether `nil` is one of this type's members (or the type itself).
    #[must_use]
    pub fn includes_nil(&self) -> bool {
        match self {
            TypeExpr::Union { members, .. } => members.iter().any(TypeExpr::includes_nil),
            other => other.is_nil(),
        }
    }

    /// Widen a literal type to its base type; other types pass through.
    #[must_use]
    pub fn widened(&self) -> TypeExpr {
        match self {
            TypeExpr::Literal { value, span } => TypeExpr::named(value.base_type_name(), *span),
            TypeExpr::Union { members, span } => {
                union_of(members.iter().map(TypeExpr::widened).collect(), *span)
            }
            other => other.clone(),
        }
    }

    /// Rank used as the leading key of the canonical ordering.
    fn rank(&self) -> u8 {
        match self {
            TypeExpr::Named { .. } => 0,
            TypeExpr::TypeVar { .. } => 1,
            TypeExpr::Literal { .. } => 2,
            TypeExpr::Function { .. } => 3,
            TypeExpr::SelfType { .. } => 4,
            TypeExpr::Intersection { .. } => 5,
            TypeExpr::Union { .. } => 6,
        }
    }

    /// Total ordering on type expressions, ignoring spans. Used to sort
    /// union/intersection members into canonical order so that printing is
    /// deterministic and structural equality is order-insensitive.
    #[must_use]
    pub fn cmp_structural(&self, other: &TypeExpr) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (
                TypeExpr::Named { name: a, args: x, .. },
                TypeExpr::Named { name: b, args: y, .. },
            ) => name_order(a, b).then_with(|| cmp_lists(x, y)),
            (TypeExpr::TypeVar { name: a, .. }, TypeExpr::TypeVar { name: b, .. }) => a.cmp(b),
            (TypeExpr::Literal { value: a, .. }, TypeExpr::Literal { value: b, .. }) => a.cmp(b),
            (
                TypeExpr::Function { params: x, ret: r, .. },
                TypeExpr::Function { params: y, ret: s, .. },
            ) => cmp_lists(x, y).then_with(|| r.cmp_structural(s)),
            (TypeExpr::SelfType { .. }, TypeExpr::SelfType { .. }) => Ordering::Equal,
            (TypeExpr::Union { members: x, .. }, TypeExpr::Union { members: y, .. })
            | (
                TypeExpr::Intersection { members: x, .. },
                TypeExpr::Intersection { members: y, .. },
            ) => cmp_lists(x, y),
            _ => Ordering::Equal,
        }
    }
}

/// `nil` sorts after every other name so unions print as `(String | nil)`.
fn name_order(a: &str, b: &str) -> Ordering {
    match (a == "nil", b == "nil") {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

fn cmp_lists(a: &[TypeExpr], b: &[TypeExpr]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.cmp_structural(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

// Structural equality: spans are ignored.
impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_structural(other) == Ordering::Equal
    }
}

impl Eq for TypeExpr {}

impl std::hash::Hash for TypeExpr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            TypeExpr::Named { name, args, .. } => {
                name.hash(state);
                for arg in args {
                    arg.hash(state);
                }
            }
            TypeExpr::TypeVar { name, .. } => name.hash(state),
            TypeExpr::Literal { value, .. } => value.hash(state),
            TypeExpr::Function { params, ret, .. } => {
                for p in params {
                    p.hash(state);
                }
                ret.hash(state);
            }
            TypeExpr::SelfType { .. } => {}
            TypeExpr::Union { members, .. } | TypeExpr::Intersection { members, .. } => {
                for m in members {
                    m.hash(state);
                }
            }
        }
    }
}

/// Build a union. Flattens nested unions, removes structural duplicates,
/// drops `never` members (the bottom type is the union identity), sorts
/// into canonical order and collapses a single-member result. An empty
/// member list yields `never`.
#[must_use]
pub fn union_of(members: Vec<TypeExpr>, span: Span) -> TypeExpr {
    let mut flat: Vec<TypeExpr> = Vec::with_capacity(members.len());
    flatten_unions(members, &mut flat);
    let mut unique: Vec<TypeExpr> = Vec::with_capacity(flat.len());
    for member in flat {
        if !member.is_never() && !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique.sort_by(TypeExpr::cmp_structural);
    match unique.len() {
        0 => TypeExpr::never(span),
        1 => unique.into_iter().next().expect("one member"),
        _ => TypeExpr::Union {
            members: unique,
            span,
        },
    }
}

fn flatten_unions(members: Vec<TypeExpr>, out: &mut Vec<TypeExpr>) {
    for member in members {
        match member {
            TypeExpr::Union { members, .. } => flatten_unions(members, out),
            other => out.push(other),
        }
    }
}

/// Build an intersection. Flattens, dedupes and sorts like [`union_of`];
/// additionally `never` absorbs everything and `any` is the identity.
#[must_use]
pub fn intersection_of(members: Vec<TypeExpr>, span: Span) -> TypeExpr {
    let mut flat: Vec<TypeExpr> = Vec::with_capacity(members.len());
    flatten_intersections(members, &mut flat);
    if flat.iter().any(TypeExpr::is_never) {
        return TypeExpr::never(span);
    }
    let mut unique: Vec<TypeExpr> = Vec::with_capacity(flat.len());
    for member in flat {
        if !member.is_any() && !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique.sort_by(TypeExpr::cmp_structural);
    match unique.len() {
        0 => TypeExpr::any(span),
        1 => unique.into_iter().next().expect("one member"),
        _ => TypeExpr::Intersection {
            members: unique,
            span,
        },
    }
}

fn flatten_intersections(members: Vec<TypeExpr>, out: &mut Vec<TypeExpr>) {
    for member in members {
        match member {
            TypeExpr::Intersection { members, .. } => flatten_intersections(members, out),
            other => out.push(other),
        }
    }
}

/// Build `Optional(T)` as `Union(T, nil)`. `Optional(nil)` collapses to
/// `nil` and `Optional(Optional(T))` to `Optional(T)` via union rules.
#[must_use]
pub fn optional_of(inner: TypeExpr, span: Span) -> TypeExpr {
    union_of(vec![inner, TypeExpr::nil(span)], span)
}

/// Resolve alternate spellings of builtin names to their canonical form.
/// `Bool` and `Boolean` are both accepted for the boolean type; `untyped`
/// is the signature-language name of `any`.
#[must_use]
pub fn canonical_type_name(name: &str) -> &str {
    match name {
        "Bool" | "Boolean" | "boolean" => BOOL,
        "untyped" => ANY,
        other => other,
    }
}

impl std::fmt::Display for TypeExpr {
    /// Print in trb source syntax. Printing then reparsing yields a
    /// structurally equal expression.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Named { name, args, .. } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Union { members, .. } => {
                // `T | nil` prints in optional-suffix form.
                if members.len() == 2 && members[1].is_nil() {
                    return match &members[0] {
                        inner @ (TypeExpr::Union { .. }
                        | TypeExpr::Intersection { .. }
                        | TypeExpr::Function { .. }) => write!(f, "({inner})?"),
                        inner => write!(f, "{inner}?"),
                    };
                }
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeExpr::Intersection { members, .. } => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    match member {
                        union @ TypeExpr::Union { .. } => write!(f, "({union})")?,
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            TypeExpr::TypeVar { name, .. } => write!(f, "{name}"),
            TypeExpr::Literal { value, .. } => write!(f, "{value}"),
            TypeExpr::Function { params, ret, .. } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
            TypeExpr::SelfType { .. } => write!(f, "self"),
        }
    }
}
