//! Branch folding.
//!
//! `if` statements whose condition is a literal collapse to the branch
//! that would run, spliced into the enclosing block. Ruby truthiness:
//! only `false` and `nil` are falsy.

use super::{Pass, PassStats, for_each_block};
use trb_parser::{Block, Expr, ExprKind, LiteralValue, Program};

pub struct BranchFolding;

impl Pass for BranchFolding {
    fn name(&self) -> &'static str {
        "branch-folding"
    }

    fn run(&self, program: &mut Program) -> PassStats {
        let mut stats = PassStats::default();
        for_each_block(program, &mut |block| {
            fold_block(block, &mut stats);
        });
        stats
    }
}

fn fold_block(block: &mut Block, stats: &mut PassStats) {
    let mut rewritten: Vec<Expr> = Vec::with_capacity(block.statements.len());
    for statement in block.statements.drain(..) {
        match decided_branch(&statement) {
            Some(mut taken) => {
                stats.rewritten += 1;
                rewritten.append(&mut taken.statements);
            }
            None => rewritten.push(statement),
        }
    }
    block.statements = rewritten;
}

/// If the statement is an `if`/`unless` with a literal condition, return
/// the branch that runs (empty when there is none).
fn decided_branch(statement: &Expr) -> Option<Block> {
    let ExprKind::If {
        condition,
        then_branch,
        else_branch,
        negated,
    } = &statement.kind
    else {
        return None;
    };
    let truthy = literal_truthiness(condition)? != *negated;
    let taken = if truthy {
        then_branch.clone()
    } else {
        else_branch.clone().unwrap_or_default()
    };
    Some(taken)
}

/// Ruby truthiness of a literal condition, if the condition is one.
fn literal_truthiness(condition: &Expr) -> Option<bool> {
    match &condition.kind {
        ExprKind::Literal(LiteralValue::Bool(value)) => Some(*value),
        ExprKind::Literal(LiteralValue::Nil) => Some(false),
        ExprKind::Literal(_) => Some(true),
        _ => None,
    }
}
