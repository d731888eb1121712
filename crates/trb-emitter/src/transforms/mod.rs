//! Optional IR-to-IR rewrites.
//!
//! Passes are pluggable and idempotent; the [`Optimizer`] runs its pass
//! list until a fixed point or [`MAX_PASSES`] iterations, whichever comes
//! first, and reports per-pass statistics. Every rewrite must preserve
//! the observable behavior of the runtime output.
//!
//! Optimized programs lose their source-span fidelity, so the driver
//! switches to the regenerative printer after running the optimizer.

pub mod branch_folding;
pub mod constant_folding;
pub mod dead_code;
pub mod inline_alias;

use rustc_hash::FxHashMap;
use trb_parser::{Block, Declaration, Expr, ExprKind, Program};

/// Upper bound on fixed-point iterations.
pub const MAX_PASSES: u32 = 8;

/// What one pass did in one iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Nodes replaced by a simpler equivalent.
    pub rewritten: u32,
    /// Statements removed outright.
    pub eliminated: u32,
}

impl PassStats {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.rewritten > 0 || self.eliminated > 0
    }
}

/// Accumulated statistics for one named pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformStats {
    pub pass: &'static str,
    pub rewritten: u32,
    pub eliminated: u32,
}

/// One rewriting pass over a program.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, program: &mut Program) -> PassStats;
}

/// Runs a pass list to a fixed point.
pub struct Optimizer {
    passes: Vec<Box<dyn Pass>>,
    max_passes: u32,
}

impl Optimizer {
    /// The standard pass list, in dependency order: fold constants first
    /// so branch folding sees literal conditions, eliminate dead code
    /// last.
    #[must_use]
    pub fn standard() -> Self {
        Optimizer {
            passes: vec![
                Box::new(constant_folding::ConstantFolding),
                Box::new(branch_folding::BranchFolding),
                Box::new(inline_alias::InlineTrivialAlias),
                Box::new(dead_code::DeadCodeElimination),
            ],
            max_passes: MAX_PASSES,
        }
    }

    /// An optimizer with a custom pass list.
    #[must_use]
    pub fn with_passes(passes: Vec<Box<dyn Pass>>) -> Self {
        Optimizer {
            passes,
            max_passes: MAX_PASSES,
        }
    }

    /// Run to a fixed point, returning the rewritten program and the
    /// per-pass totals.
    #[must_use]
    pub fn run(&self, program: &Program) -> (Program, Vec<TransformStats>) {
        let mut program = program.clone();
        let mut totals: FxHashMap<&'static str, PassStats> = FxHashMap::default();
        let mut order: Vec<&'static str> = Vec::new();

        for iteration in 0..self.max_passes {
            let mut changed = false;
            for pass in &self.passes {
                let stats = pass.run(&mut program);
                changed |= stats.changed();
                let entry = totals.entry(pass.name()).or_insert_with(|| {
                    order.push(pass.name());
                    PassStats::default()
                });
                entry.rewritten += stats.rewritten;
                entry.eliminated += stats.eliminated;
            }
            if !changed {
                tracing::debug!(iterations = iteration + 1, "optimizer reached fixed point");
                break;
            }
        }

        let stats = order
            .into_iter()
            .map(|pass| {
                let s = totals[pass];
                TransformStats {
                    pass,
                    rewritten: s.rewritten,
                    eliminated: s.eliminated,
                }
            })
            .collect();
        (program, stats)
    }
}

// =============================================================================
// Shared IR walking helpers
// =============================================================================

/// Apply `f` to every statement block in the program (function bodies and
/// every nested block inside their expressions).
pub(crate) fn for_each_block(program: &mut Program, f: &mut dyn FnMut(&mut Block)) {
    for_each_block_in_decls(&mut program.declarations, f);
}

fn for_each_block_in_decls(declarations: &mut [Declaration], f: &mut dyn FnMut(&mut Block)) {
    for decl in declarations {
        match decl {
            Declaration::Function(func) => {
                if let Some(body) = &mut func.body {
                    apply_to_block(body, f);
                }
            }
            Declaration::Class(class) => for_each_block_in_decls(&mut class.members, f),
            Declaration::Module(module) => for_each_block_in_decls(&mut module.members, f),
            Declaration::Constant(constant) => {
                for_each_block_in_expr(&mut constant.value, f);
            }
            Declaration::Statement(expr) => for_each_block_in_expr(expr, f),
            Declaration::Interface(_) | Declaration::TypeAlias(_) => {}
        }
    }
}

/// Depth-first: inner blocks first, then the block itself.
fn apply_to_block(block: &mut Block, f: &mut dyn FnMut(&mut Block)) {
    for statement in &mut block.statements {
        for_each_block_in_expr(statement, f);
    }
    f(block);
}

pub(crate) fn for_each_block_in_expr(expr: &mut Expr, f: &mut dyn FnMut(&mut Block)) {
    match &mut expr.kind {
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            for_each_block_in_expr(condition, f);
            apply_to_block(then_branch, f);
            if let Some(block) = else_branch {
                apply_to_block(block, f);
            }
        }
        ExprKind::Case {
            scrutinee,
            arms,
            else_branch,
        } => {
            if let Some(scrutinee) = scrutinee {
                for_each_block_in_expr(scrutinee, f);
            }
            for (patterns, body) in arms {
                for pattern in patterns {
                    for_each_block_in_expr(pattern, f);
                }
                apply_to_block(body, f);
            }
            if let Some(block) = else_branch {
                apply_to_block(block, f);
            }
        }
        ExprKind::While { condition, body, .. } => {
            for_each_block_in_expr(condition, f);
            apply_to_block(body, f);
        }
        ExprKind::Lambda { body, .. } => apply_to_block(body, f),
        ExprKind::MethodCall {
            receiver,
            args,
            kwargs,
            block,
            ..
        } => {
            if let Some(receiver) = receiver {
                for_each_block_in_expr(receiver, f);
            }
            for arg in args {
                for_each_block_in_expr(arg, f);
            }
            for (_, value) in kwargs {
                for_each_block_in_expr(value, f);
            }
            if let Some(block_arg) = block {
                apply_to_block(&mut block_arg.body, f);
            }
        }
        ExprKind::Assignment { target, value, .. } => {
            for_each_block_in_expr(target, f);
            for_each_block_in_expr(value, f);
        }
        ExprKind::Binary { left, right, .. } => {
            for_each_block_in_expr(left, f);
            for_each_block_in_expr(right, f);
        }
        ExprKind::Unary { operand, .. } => for_each_block_in_expr(operand, f),
        ExprKind::SafeNavigation { receiver, args, .. } => {
            for_each_block_in_expr(receiver, f);
            for arg in args {
                for_each_block_in_expr(arg, f);
            }
        }
        ExprKind::Index { receiver, args } => {
            for_each_block_in_expr(receiver, f);
            for arg in args {
                for_each_block_in_expr(arg, f);
            }
        }
        ExprKind::Return { value } | ExprKind::Raise { value } => {
            if let Some(value) = value {
                for_each_block_in_expr(value, f);
            }
        }
        ExprKind::Interpolation(parts) => {
            for part in parts {
                if let trb_parser::InterpolationPart::Expr(inner) = part {
                    for_each_block_in_expr(inner, f);
                }
            }
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements {
                for_each_block_in_expr(element, f);
            }
        }
        ExprKind::HashLiteral(entries) => {
            for (key, value) in entries {
                for_each_block_in_expr(key, f);
                for_each_block_in_expr(value, f);
            }
        }
        ExprKind::TypeAssertion { expr: inner, .. } => for_each_block_in_expr(inner, f),
        ExprKind::Literal(_) | ExprKind::VariableRef { .. } | ExprKind::Raw { .. } => {}
    }
}

/// Apply `f` bottom-up to every expression in the program.
pub(crate) fn for_each_expr(program: &mut Program, f: &mut dyn FnMut(&mut Expr)) {
    for_each_expr_in_decls(&mut program.declarations, f);
}

fn for_each_expr_in_decls(declarations: &mut [Declaration], f: &mut dyn FnMut(&mut Expr)) {
    for decl in declarations {
        match decl {
            Declaration::Function(func) => {
                if let Some(body) = &mut func.body {
                    for statement in &mut body.statements {
                        visit_expr(statement, f);
                    }
                }
            }
            Declaration::Class(class) => for_each_expr_in_decls(&mut class.members, f),
            Declaration::Module(module) => for_each_expr_in_decls(&mut module.members, f),
            Declaration::Constant(constant) => visit_expr(&mut constant.value, f),
            Declaration::Statement(expr) => visit_expr(expr, f),
            Declaration::Interface(_) | Declaration::TypeAlias(_) => {}
        }
    }
}

fn visit_block_exprs(block: &mut Block, f: &mut dyn FnMut(&mut Expr)) {
    for statement in &mut block.statements {
        visit_expr(statement, f);
    }
}

/// Bottom-up expression visitor: children first, then the node.
pub(crate) fn visit_expr(expr: &mut Expr, f: &mut dyn FnMut(&mut Expr)) {
    match &mut expr.kind {
        ExprKind::Assignment { target, value, .. } => {
            visit_expr(target, f);
            visit_expr(value, f);
        }
        ExprKind::Binary { left, right, .. } => {
            visit_expr(left, f);
            visit_expr(right, f);
        }
        ExprKind::Unary { operand, .. } => visit_expr(operand, f),
        ExprKind::MethodCall {
            receiver,
            args,
            kwargs,
            block,
            ..
        } => {
            if let Some(receiver) = receiver {
                visit_expr(receiver, f);
            }
            for arg in args {
                visit_expr(arg, f);
            }
            for (_, value) in kwargs {
                visit_expr(value, f);
            }
            if let Some(block_arg) = block {
                visit_block_exprs(&mut block_arg.body, f);
            }
        }
        ExprKind::SafeNavigation { receiver, args, .. } => {
            visit_expr(receiver, f);
            for arg in args {
                visit_expr(arg, f);
            }
        }
        ExprKind::Index { receiver, args } => {
            visit_expr(receiver, f);
            for arg in args {
                visit_expr(arg, f);
            }
        }
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            visit_expr(condition, f);
            visit_block_exprs(then_branch, f);
            if let Some(block) = else_branch {
                visit_block_exprs(block, f);
            }
        }
        ExprKind::Case {
            scrutinee,
            arms,
            else_branch,
        } => {
            if let Some(scrutinee) = scrutinee {
                visit_expr(scrutinee, f);
            }
            for (patterns, body) in arms {
                for pattern in patterns {
                    visit_expr(pattern, f);
                }
                visit_block_exprs(body, f);
            }
            if let Some(block) = else_branch {
                visit_block_exprs(block, f);
            }
        }
        ExprKind::While { condition, body, .. } => {
            visit_expr(condition, f);
            visit_block_exprs(body, f);
        }
        ExprKind::Return { value } | ExprKind::Raise { value } => {
            if let Some(value) = value {
                visit_expr(value, f);
            }
        }
        ExprKind::Lambda { body, .. } => visit_block_exprs(body, f),
        ExprKind::Interpolation(parts) => {
            for part in parts {
                if let trb_parser::InterpolationPart::Expr(inner) = part {
                    visit_expr(inner, f);
                }
            }
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements {
                visit_expr(element, f);
            }
        }
        ExprKind::HashLiteral(entries) => {
            for (key, value) in entries {
                visit_expr(key, f);
                visit_expr(value, f);
            }
        }
        ExprKind::TypeAssertion { expr: inner, .. } => visit_expr(inner, f),
        ExprKind::Literal(_) | ExprKind::VariableRef { .. } | ExprKind::Raw { .. } => {}
    }
    f(expr);
}
