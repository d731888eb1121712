//! Dead-code elimination.
//!
//! Statements after an unconditional `return`/`raise` (or a conditional
//! whose every branch terminates) can never run and are dropped.

use super::{Pass, PassStats, for_each_block};
use trb_parser::{Expr, Program};

pub struct DeadCodeElimination;

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dead-code-elimination"
    }

    fn run(&self, program: &mut Program) -> PassStats {
        let mut stats = PassStats::default();
        for_each_block(program, &mut |block| {
            if let Some(cut) = block.statements.iter().position(Expr::is_terminator) {
                let dead = block.statements.len().saturating_sub(cut + 1);
                if dead > 0 {
                    block.statements.truncate(cut + 1);
                    stats.eliminated += u32::try_from(dead).unwrap_or(u32::MAX);
                }
            }
        });
        stats
    }
}
