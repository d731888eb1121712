//! Builtin typing knowledge: the fixed operator table, a catalog of
//! common stdlib method return types, and receiverless kernel functions.
//!
//! The catalog is intentionally shallow - it covers the methods that show
//! up constantly in real code so that inference produces useful signatures
//! without a full core-library model. Anything unknown falls back to
//! `any`.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use trb_common::Span;
use trb_parser::BinOp;
use trb_parser::ir::types::TypeExpr;

fn named(name: &str) -> TypeExpr {
    TypeExpr::named(name, Span::dummy())
}

fn array_of(element: TypeExpr) -> TypeExpr {
    TypeExpr::Named {
        name: "Array".to_string(),
        args: vec![element],
        span: Span::dummy(),
    }
}

/// Result type of a binary operator on builtin operands, if the table
/// knows it. `None` defers to user-defined operator lookup.
#[must_use]
pub fn operator_result(op: BinOp, left: &TypeExpr, right: &TypeExpr) -> Option<TypeExpr> {
    use BinOp::*;

    if op.is_comparison() {
        return Some(named("bool"));
    }
    match op {
        Spaceship => return Some(named("Integer")),
        And | Or => {
            // `a && b` evaluates to one of its operands.
            return Some(trb_parser::union_of(
                vec![left.clone(), right.clone()],
                Span::dummy(),
            ));
        }
        Range | RangeExclusive => {
            return Some(TypeExpr::Named {
                name: "Range".to_string(),
                args: vec![left.widened()],
                span: Span::dummy(),
            });
        }
        _ => {}
    }

    let left = left.widened();
    let right = right.widened();
    let pair = (type_name(&left)?, type_name(&right)?);
    let result = match (op, pair) {
        (Add | Sub | Mul | Div | Mod | Pow, ("Integer", "Integer")) => named("Integer"),
        (Add | Sub | Mul | Div | Pow, ("Integer", "Float") | ("Float", "Integer") | ("Float", "Float")) => {
            named("Float")
        }
        (Add, ("String", "String")) => named("String"),
        (Mul, ("String", "Integer")) => named("String"),
        (Add, ("Array", _)) => left.clone(),
        (Shl, ("Array", _)) => left.clone(),
        (Shl, ("String", "String")) => named("String"),
        (Shl | Shr | BitAnd | BitOr | BitXor, ("Integer", "Integer")) => named("Integer"),
        _ => return None,
    };
    Some(result)
}

fn type_name(ty: &TypeExpr) -> Option<&str> {
    match ty {
        TypeExpr::Named { name, .. } => Some(name),
        _ => None,
    }
}

/// Return type of `method` on a builtin receiver type, if known.
///
/// Generic receivers pass their arguments through: `Array<T>#first`
/// yields `T?`, `Hash<K, V>#keys` yields `Array<K>`.
#[must_use]
pub fn method_result(receiver: &TypeExpr, method: &str) -> Option<TypeExpr> {
    // Universal object protocol first.
    match method {
        "nil?" | "frozen?" | "is_a?" | "kind_of?" | "instance_of?" | "respond_to?" | "eql?"
        | "equal?" => return Some(named("bool")),
        "to_s" | "inspect" => return Some(named("String")),
        "freeze" | "dup" | "clone" | "tap" | "itself" => return Some(receiver.clone()),
        "hash" | "object_id" => return Some(named("Integer")),
        _ => {}
    }

    let TypeExpr::Named { name, args, .. } = receiver else {
        return None;
    };

    let result = match (name.as_str(), method) {
        ("String", "upcase" | "downcase" | "capitalize" | "strip" | "lstrip" | "rstrip"
            | "chomp" | "chop" | "reverse" | "squeeze" | "succ" | "tr" | "gsub" | "sub"
            | "center" | "ljust" | "rjust" | "slice") => named("String"),
        ("String", "length" | "size" | "bytesize" | "count" | "to_i" | "ord" | "hash") => {
            named("Integer")
        }
        ("String", "to_f") => named("Float"),
        ("String", "to_sym") => named("Symbol"),
        ("String", "empty?" | "start_with?" | "end_with?" | "include?" | "match?") => named("bool"),
        ("String", "split" | "chars" | "lines" | "bytes" | "scan") => array_of(named("String")),
        ("String", "index") => trb_parser::optional_of(named("Integer"), Span::dummy()),

        ("Integer", "abs" | "succ" | "pred" | "floor" | "ceil" | "round" | "truncate"
            | "to_i" | "gcd" | "lcm" | "pow" | "digits_sum") => named("Integer"),
        ("Integer", "to_f" | "fdiv") => named("Float"),
        ("Integer", "even?" | "odd?" | "zero?" | "positive?" | "negative?" | "between?") => {
            named("bool")
        }
        ("Integer", "digits") => array_of(named("Integer")),
        ("Integer", "times" | "upto" | "downto") => named("Integer"),
        ("Integer", "chr") => named("String"),

        ("Float", "abs" | "to_f") => named("Float"),
        ("Float", "floor" | "ceil" | "round" | "truncate" | "to_i") => named("Integer"),
        ("Float", "zero?" | "positive?" | "negative?" | "nan?" | "finite?" | "infinite?") => {
            named("bool")
        }

        ("Symbol", "to_proc") => named("Proc"),
        ("Symbol", "length" | "size") => named("Integer"),

        ("Array", "length" | "size" | "count" | "index" | "find_index") => named("Integer"),
        ("Array", "empty?" | "any?" | "all?" | "none?" | "include?") => named("bool"),
        ("Array", "first" | "last" | "sample" | "min" | "max" | "find" | "detect" | "sum"
            | "pop" | "shift") => args.first().cloned().unwrap_or_else(|| named("any")),
        ("Array", "join") => named("String"),
        ("Array", "sort" | "sort_by" | "reverse" | "uniq" | "compact" | "flatten" | "shuffle"
            | "take" | "drop" | "select" | "filter" | "reject" | "rotate" | "each"
            | "each_with_index" | "push" | "append" | "concat") => receiver.clone(),
        ("Array", "to_a") => receiver.clone(),

        ("Hash", "length" | "size" | "count") => named("Integer"),
        ("Hash", "empty?" | "key?" | "has_key?" | "include?" | "member?" | "value?"
            | "has_value?") => named("bool"),
        ("Hash", "keys") => array_of(args.first().cloned().unwrap_or_else(|| named("any"))),
        ("Hash", "values") => array_of(args.get(1).cloned().unwrap_or_else(|| named("any"))),
        ("Hash", "fetch" | "delete") => args.get(1).cloned().unwrap_or_else(|| named("any")),
        ("Hash", "merge" | "each" | "select" | "filter" | "reject") => receiver.clone(),

        ("Range", "to_a" | "map") => array_of(args.first().cloned().unwrap_or_else(|| named("any"))),
        ("Range", "include?" | "cover?") => named("bool"),
        ("Range", "min" | "max" | "first" | "last" | "sum") => {
            args.first().cloned().unwrap_or_else(|| named("any"))
        }

        _ => return None,
    };
    Some(result)
}

/// Element type produced by indexing a builtin container.
#[must_use]
pub fn index_result(receiver: &TypeExpr) -> Option<TypeExpr> {
    let TypeExpr::Named { name, args, .. } = receiver else {
        return None;
    };
    match name.as_str() {
        "Array" => Some(args.first().cloned().unwrap_or_else(|| named("any"))),
        "Hash" => Some(args.get(1).cloned().unwrap_or_else(|| named("any"))),
        "String" => Some(named("String")),
        _ => None,
    }
}

/// Receiverless kernel functions and their return types.
pub static KERNEL_FUNCTIONS: Lazy<FxHashMap<&'static str, TypeExpr>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("puts", named("nil"));
    map.insert("print", named("nil"));
    map.insert("p", named("any"));
    map.insert("pp", named("any"));
    map.insert("gets", trb_parser::optional_of(named("String"), Span::dummy()));
    map.insert("rand", named("Float"));
    map.insert("sleep", named("Integer"));
    map.insert("require", named("bool"));
    map.insert("require_relative", named("bool"));
    map.insert("loop", named("nil"));
    map.insert("exit", named("never"));
    map.insert("format", named("String"));
    map.insert("sprintf", named("String"));
    map.insert("Integer", named("Integer"));
    map.insert("Float", named("Float"));
    map.insert("String", named("String"));
    map.insert("Array", array_of(named("any")));
    map
});
