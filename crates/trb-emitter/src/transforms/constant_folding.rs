//! Constant folding.
//!
//! Literal-only arithmetic, comparisons, string concatenation and unary
//! operations reduce to a single literal node. Division by a zero
//! literal is left alone (the runtime raises there, and that behavior
//! must survive).

use super::{Pass, PassStats, for_each_expr};
use trb_parser::{BinOp, ExprKind, LiteralValue, Program, UnOp};

pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run(&self, program: &mut Program) -> PassStats {
        let mut stats = PassStats::default();
        for_each_expr(program, &mut |expr| {
            let folded = match &expr.kind {
                ExprKind::Binary { op, left, right } => {
                    match (&left.kind, &right.kind) {
                        (ExprKind::Literal(a), ExprKind::Literal(b)) => fold_binary(*op, a, b),
                        _ => None,
                    }
                }
                ExprKind::Unary { op, operand } => match &operand.kind {
                    ExprKind::Literal(value) => fold_unary(*op, value),
                    _ => None,
                },
                _ => None,
            };
            if let Some(value) = folded {
                expr.kind = ExprKind::Literal(value);
                stats.rewritten += 1;
            }
        });
        stats
    }
}

fn fold_binary(op: BinOp, left: &LiteralValue, right: &LiteralValue) -> Option<LiteralValue> {
    use LiteralValue::*;
    let value = match (op, left, right) {
        (BinOp::Add, Int(a), Int(b)) => Int(a.checked_add(*b)?),
        (BinOp::Sub, Int(a), Int(b)) => Int(a.checked_sub(*b)?),
        (BinOp::Mul, Int(a), Int(b)) => Int(a.checked_mul(*b)?),
        (BinOp::Div, Int(a), Int(b)) if *b != 0 => Int(a / b),
        (BinOp::Mod, Int(a), Int(b)) if *b != 0 => Int(a.rem_euclid(*b)),
        (BinOp::Pow, Int(a), Int(b)) if (0..=31).contains(b) => {
            Int(a.checked_pow(u32::try_from(*b).ok()?)?)
        }
        (BinOp::Add, Float(a), Float(b)) => Float(a + b),
        (BinOp::Sub, Float(a), Float(b)) => Float(a - b),
        (BinOp::Mul, Float(a), Float(b)) => Float(a * b),
        (BinOp::Add, Str(a), Str(b)) => Str(format!("{a}{b}")),
        (BinOp::Eq, a, b) => Bool(literal_eq(a, b)?),
        (BinOp::NotEq, a, b) => Bool(!literal_eq(a, b)?),
        (BinOp::Lt, Int(a), Int(b)) => Bool(a < b),
        (BinOp::LtEq, Int(a), Int(b)) => Bool(a <= b),
        (BinOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinOp::GtEq, Int(a), Int(b)) => Bool(a >= b),
        _ => return None,
    };
    Some(value)
}

/// Literal equality where it is decidable without runtime semantics.
fn literal_eq(a: &LiteralValue, b: &LiteralValue) -> Option<bool> {
    use LiteralValue::*;
    match (a, b) {
        (Int(x), Int(y)) => Some(x == y),
        (Str(x), Str(y)) => Some(x == y),
        (Bool(x), Bool(y)) => Some(x == y),
        (Symbol(x), Symbol(y)) => Some(x == y),
        (Nil, Nil) => Some(true),
        _ => None,
    }
}

fn fold_unary(op: UnOp, value: &LiteralValue) -> Option<LiteralValue> {
    use LiteralValue::*;
    let folded = match (op, value) {
        (UnOp::Neg, Int(v)) => Int(v.checked_neg()?),
        (UnOp::Neg, Float(v)) => Float(-v),
        (UnOp::Not, Bool(v)) => Bool(!v),
        (UnOp::Not, Nil) => Bool(true),
        _ => return None,
    };
    Some(folded)
}
