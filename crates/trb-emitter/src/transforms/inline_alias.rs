//! Trivial-alias inlining.
//!
//! An assignment `x = <literal>` whose variable is read exactly once in
//! the remainder of the block, and never written again, is substituted
//! into its single use and removed.

use super::{Pass, PassStats, for_each_block, visit_expr};
use trb_parser::{Block, Expr, ExprKind, LiteralValue, Program, ScopeKind};

pub struct InlineTrivialAlias;

impl Pass for InlineTrivialAlias {
    fn name(&self) -> &'static str {
        "inline-trivial-alias"
    }

    fn run(&self, program: &mut Program) -> PassStats {
        let mut stats = PassStats::default();
        for_each_block(program, &mut |block| {
            inline_in_block(block, &mut stats);
        });
        stats
    }
}

fn inline_in_block(block: &mut Block, stats: &mut PassStats) {
    let mut index = 0;
    while index < block.statements.len() {
        let Some((name, literal)) = trivial_alias(&block.statements[index]) else {
            index += 1;
            continue;
        };

        let rest = &block.statements[index + 1..];
        let reads: usize = rest.iter().map(|s| count_reads(s, &name)).sum();
        let writes: usize = rest.iter().map(|s| count_writes(s, &name)).sum();
        if reads != 1 || writes != 0 {
            index += 1;
            continue;
        }

        block.statements.remove(index);
        for statement in block.statements.iter_mut().skip(index) {
            substitute_read(statement, &name, &literal);
        }
        stats.rewritten += 1;
        // Do not advance: the statement now at `index` may be another
        // trivial alias.
    }
}

/// `x = <literal>` at statement position, with a plain local target.
fn trivial_alias(statement: &Expr) -> Option<(String, LiteralValue)> {
    let ExprKind::Assignment { target, value, .. } = &statement.kind else {
        return None;
    };
    let ExprKind::VariableRef {
        name,
        scope: ScopeKind::Local,
    } = &target.kind
    else {
        return None;
    };
    let ExprKind::Literal(literal) = &value.kind else {
        return None;
    };
    Some((name.clone(), literal.clone()))
}

fn count_reads(statement: &Expr, name: &str) -> usize {
    let mut count = 0;
    let mut statement = statement.clone();
    visit_expr(&mut statement, &mut |expr| {
        if let ExprKind::VariableRef {
            name: ref_name,
            scope: ScopeKind::Local,
        } = &expr.kind
            && ref_name == name
        {
            count += 1;
        }
    });
    // An assignment target is not a read.
    count - count_writes(&statement, name)
}

fn count_writes(statement: &Expr, name: &str) -> usize {
    let mut count = 0;
    let mut statement = statement.clone();
    visit_expr(&mut statement, &mut |expr| {
        if let ExprKind::Assignment { target, .. } = &expr.kind
            && let ExprKind::VariableRef {
                name: ref_name,
                scope: ScopeKind::Local,
            } = &target.kind
            && ref_name == name
        {
            count += 1;
        }
    });
    count
}

fn substitute_read(statement: &mut Expr, name: &str, literal: &LiteralValue) {
    visit_expr(statement, &mut |expr| {
        if let ExprKind::VariableRef {
            name: ref_name,
            scope: ScopeKind::Local,
        } = &expr.kind
            && ref_name == name
        {
            expr.kind = ExprKind::Literal(literal.clone());
        }
    });
}
