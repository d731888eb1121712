//! Source-preserving runtime emission.
//!
//! The parser records the byte span of every type-only fragment:
//! parameter and return annotations, generic parameter lists, variable
//! type declarations, `implements` clauses, `type` aliases, `interface`
//! blocks and `as` assertions. This module deletes exactly those spans
//! from the original text, which leaves a plain Ruby program with all
//! comments and formatting intact.
//!
//! Two deletion flavors:
//! - *inline*: remove the bytes of the span only (`name: String` ->
//!   `name`);
//! - *line*: remove whole source lines, newline included (`@name: String`
//!   declaration lines, `interface ... end` blocks, `type X = ...`).

use trb_common::Span;
use trb_parser::{
    Block, BlockArg, ClassDecl, Declaration, Expr, ExprKind, FunctionDecl, Param, Program,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeletionKind {
    Inline,
    Line,
}

#[derive(Clone, Copy, Debug)]
struct Deletion {
    span: Span,
    kind: DeletionKind,
}

/// Produce the runtime Ruby text for `source` by deleting every
/// type-only fragment located by `program`'s spans.
#[must_use]
pub fn erase_types(source: &str, program: &Program) -> String {
    let mut deletions = Vec::new();
    collect_declarations(&program.declarations, &mut deletions);

    // Expand line deletions to full lines, then drop deletions nested
    // inside another (an annotation inside an erased interface block).
    for deletion in &mut deletions {
        if deletion.kind == DeletionKind::Line {
            deletion.span = expand_to_lines(source, deletion.span);
        }
    }
    deletions.sort_by_key(|d| (d.span.start, std::cmp::Reverse(d.span.end)));
    let mut kept: Vec<Span> = Vec::with_capacity(deletions.len());
    for deletion in deletions {
        if kept.last().is_some_and(|prev| prev.contains_span(deletion.span)) {
            continue;
        }
        kept.push(deletion.span);
    }

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for span in kept {
        let start = (span.start as usize).min(source.len());
        let end = (span.end as usize).min(source.len());
        if start > cursor {
            output.push_str(&source[cursor..start]);
        }
        cursor = cursor.max(end);
    }
    if cursor < source.len() {
        output.push_str(&source[cursor..]);
    }
    output
}

/// Grow a span to cover the full lines it touches, trailing newline
/// included.
fn expand_to_lines(source: &str, span: Span) -> Span {
    let bytes = source.as_bytes();
    let mut start = (span.start as usize).min(bytes.len());
    while start > 0 && bytes[start - 1] != b'\n' {
        start -= 1;
    }
    let mut end = (span.end as usize).min(bytes.len());
    while end < bytes.len() && bytes[end] != b'\n' {
        end += 1;
    }
    if end < bytes.len() {
        end += 1;
    }
    Span::new(start as u32, end as u32)
}

fn collect_declarations(declarations: &[Declaration], out: &mut Vec<Deletion>) {
    for decl in declarations {
        match decl {
            Declaration::Function(func) => collect_function(func, out),
            Declaration::Class(class) => collect_class(class, out),
            Declaration::Module(module) => collect_declarations(&module.members, out),
            Declaration::Interface(iface) => out.push(Deletion {
                span: iface.span,
                kind: DeletionKind::Line,
            }),
            Declaration::TypeAlias(alias) => out.push(Deletion {
                span: alias.span,
                kind: DeletionKind::Line,
            }),
            Declaration::Constant(constant) => {
                if let Some(span) = constant.annotation_span {
                    out.push(Deletion {
                        span,
                        kind: DeletionKind::Inline,
                    });
                }
                collect_expression(&constant.value, out);
            }
            Declaration::Statement(expr) => collect_expression(expr, out),
        }
    }
}

fn collect_function(func: &FunctionDecl, out: &mut Vec<Deletion>) {
    if let Some(span) = func.generics_span {
        out.push(Deletion {
            span,
            kind: DeletionKind::Inline,
        });
    }
    for param in &func.params {
        collect_param(param, out);
    }
    if let Some(span) = func.return_annotation_span {
        out.push(Deletion {
            span,
            kind: DeletionKind::Inline,
        });
    }
    if let Some(body) = &func.body {
        collect_block(body, out);
    }
}

fn collect_param(param: &Param, out: &mut Vec<Deletion>) {
    if let Some(span) = param.annotation_span {
        out.push(Deletion {
            span,
            kind: DeletionKind::Inline,
        });
    }
    if let Some(default) = &param.default {
        collect_expression(default, out);
    }
}

fn collect_class(class: &ClassDecl, out: &mut Vec<Deletion>) {
    if let Some(span) = class.generics_span {
        out.push(Deletion {
            span,
            kind: DeletionKind::Inline,
        });
    }
    for span in &class.implements_spans {
        out.push(Deletion {
            span: *span,
            kind: DeletionKind::Line,
        });
    }
    for binding in class.ivars.iter().chain(class.cvars.iter()) {
        out.push(Deletion {
            span: binding.span,
            kind: DeletionKind::Line,
        });
    }
    collect_declarations(&class.members, out);
}

fn collect_block(block: &Block, out: &mut Vec<Deletion>) {
    for statement in &block.statements {
        collect_expression(statement, out);
    }
}

fn collect_block_arg(block: &BlockArg, out: &mut Vec<Deletion>) {
    for param in &block.params {
        collect_param(param, out);
    }
    collect_block(&block.body, out);
}

fn collect_expression(expr: &Expr, out: &mut Vec<Deletion>) {
    match &expr.kind {
        ExprKind::Assignment {
            target,
            value,
            annotation_span,
            ..
        } => {
            if let Some(span) = annotation_span {
                out.push(Deletion {
                    span: *span,
                    kind: DeletionKind::Inline,
                });
            }
            collect_expression(target, out);
            collect_expression(value, out);
        }
        // `expr as T`: everything after the asserted expression goes.
        ExprKind::TypeAssertion { expr: inner, .. } => {
            out.push(Deletion {
                span: Span::new(inner.span.end, expr.span.end),
                kind: DeletionKind::Inline,
            });
            collect_expression(inner, out);
        }
        ExprKind::Lambda { params, body } => {
            for param in params {
                collect_param(param, out);
            }
            collect_block(body, out);
        }
        ExprKind::Binary { left, right, .. } => {
            collect_expression(left, out);
            collect_expression(right, out);
        }
        ExprKind::Unary { operand, .. } => collect_expression(operand, out),
        ExprKind::MethodCall {
            receiver,
            args,
            kwargs,
            block,
            ..
        } => {
            if let Some(receiver) = receiver {
                collect_expression(receiver, out);
            }
            for arg in args {
                collect_expression(arg, out);
            }
            for (_, value) in kwargs {
                collect_expression(value, out);
            }
            if let Some(block) = block {
                collect_block_arg(block, out);
            }
        }
        ExprKind::SafeNavigation { receiver, args, .. } => {
            collect_expression(receiver, out);
            for arg in args {
                collect_expression(arg, out);
            }
        }
        ExprKind::Index { receiver, args } => {
            collect_expression(receiver, out);
            for arg in args {
                collect_expression(arg, out);
            }
        }
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            collect_expression(condition, out);
            collect_block(then_branch, out);
            if let Some(block) = else_branch {
                collect_block(block, out);
            }
        }
        ExprKind::Case {
            scrutinee,
            arms,
            else_branch,
        } => {
            if let Some(scrutinee) = scrutinee {
                collect_expression(scrutinee, out);
            }
            for (patterns, body) in arms {
                for pattern in patterns {
                    collect_expression(pattern, out);
                }
                collect_block(body, out);
            }
            if let Some(block) = else_branch {
                collect_block(block, out);
            }
        }
        ExprKind::While { condition, body, .. } => {
            collect_expression(condition, out);
            collect_block(body, out);
        }
        ExprKind::Return { value } | ExprKind::Raise { value } => {
            if let Some(value) = value {
                collect_expression(value, out);
            }
        }
        ExprKind::Interpolation(parts) => {
            for part in parts {
                if let trb_parser::InterpolationPart::Expr(inner) = part {
                    collect_expression(inner, out);
                }
            }
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements {
                collect_expression(element, out);
            }
        }
        ExprKind::HashLiteral(entries) => {
            for (key, value) in entries {
                collect_expression(key, out);
                collect_expression(value, out);
            }
        }
        ExprKind::Literal(_) | ExprKind::VariableRef { .. } | ExprKind::Raw { .. } => {}
    }
}
