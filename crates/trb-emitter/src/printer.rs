//! Regenerative Ruby printing.
//!
//! Walks the IR and prints each construct in canonical formatting
//! (2-space indentation, one statement per line). Used when the optimizer
//! has transformed the tree and the original source spans no longer
//! describe it. Type-only constructs (`interface`, `type`, annotations)
//! produce no output here at all - the IR is printed as plain Ruby.

use trb_parser::{
    AttrKind, BinOp, Block, BlockArg, ClassDecl, Declaration, Expr, ExprKind, FunctionDecl,
    InterpolationPart, LiteralValue, ModuleDecl, Param, ParamKind, Program, ScopeKind, UnOp,
};

/// Print the whole program as runtime Ruby.
#[must_use]
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent: 0,
    };
    let mut first = true;
    for decl in &program.declarations {
        if matches!(
            decl,
            Declaration::Interface(_) | Declaration::TypeAlias(_)
        ) {
            continue;
        }
        if !first {
            printer.out.push('\n');
        }
        first = false;
        printer.print_declaration(decl);
    }
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn print_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Function(func) => self.print_function(func),
            Declaration::Class(class) => self.print_class(class),
            Declaration::Module(module) => self.print_module(module),
            Declaration::Constant(constant) => {
                let value = expr_text(&constant.value, 0);
                self.line(&format!("{} = {value}", constant.name));
            }
            Declaration::Statement(expr) => self.print_statement(expr),
            Declaration::Interface(_) | Declaration::TypeAlias(_) => {}
        }
    }

    fn print_function(&mut self, func: &FunctionDecl) {
        let receiver = if func.singleton { "self." } else { "" };
        let params = if func.params.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = func.params.iter().map(param_text).collect();
            format!("({})", parts.join(", "))
        };
        self.line(&format!("def {receiver}{}{params}", func.name));
        self.indent += 1;
        if let Some(body) = &func.body {
            self.print_block(body);
        }
        self.indent -= 1;
        self.line("end");
    }

    fn print_class(&mut self, class: &ClassDecl) {
        let mut header = format!("class {}", class.name);
        if let Some(parent) = &class.parent {
            header.push_str(&format!(" < {parent}"));
        }
        self.line(&header);
        self.indent += 1;
        for module in &class.includes {
            self.line(&format!("include {module}"));
        }
        for attr in &class.attrs {
            let keyword = match attr.kind {
                AttrKind::Reader => "attr_reader",
                AttrKind::Writer => "attr_writer",
                AttrKind::Accessor => "attr_accessor",
            };
            let names: Vec<String> = attr.names.iter().map(|n| format!(":{n}")).collect();
            self.line(&format!("{keyword} {}", names.join(", ")));
        }
        let mut last_visibility = trb_parser::Visibility::Public;
        for member in &class.members {
            if let Declaration::Function(func) = member
                && func.visibility != last_visibility
            {
                let marker = match func.visibility {
                    trb_parser::Visibility::Public => "public",
                    trb_parser::Visibility::Private => "private",
                    trb_parser::Visibility::Protected => "protected",
                };
                self.out.push('\n');
                self.line(marker);
                self.out.push('\n');
                last_visibility = func.visibility;
            }
            self.print_declaration(member);
        }
        self.indent -= 1;
        self.line("end");
    }

    fn print_module(&mut self, module: &ModuleDecl) {
        self.line(&format!("module {}", module.name));
        self.indent += 1;
        for member in &module.members {
            self.print_declaration(member);
        }
        self.indent -= 1;
        self.line("end");
    }

    fn print_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.print_statement(statement);
        }
    }

    fn print_statement(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
                negated,
            } => {
                let keyword = if *negated { "unless" } else { "if" };
                self.line(&format!("{keyword} {}", expr_text(condition, 0)));
                self.indent += 1;
                self.print_block(then_branch);
                self.indent -= 1;
                if let Some(else_block) = else_branch {
                    self.line("else");
                    self.indent += 1;
                    self.print_block(else_block);
                    self.indent -= 1;
                }
                self.line("end");
            }
            ExprKind::While {
                condition,
                body,
                negated,
            } => {
                let keyword = if *negated { "until" } else { "while" };
                self.line(&format!("{keyword} {}", expr_text(condition, 0)));
                self.indent += 1;
                self.print_block(body);
                self.indent -= 1;
                self.line("end");
            }
            ExprKind::Case {
                scrutinee,
                arms,
                else_branch,
            } => {
                match scrutinee {
                    Some(scrutinee) => self.line(&format!("case {}", expr_text(scrutinee, 0))),
                    None => self.line("case"),
                }
                for (patterns, body) in arms {
                    let printed: Vec<String> =
                        patterns.iter().map(|p| expr_text(p, 0)).collect();
                    self.line(&format!("when {}", printed.join(", ")));
                    self.indent += 1;
                    self.print_block(body);
                    self.indent -= 1;
                }
                if let Some(else_block) = else_branch {
                    self.line("else");
                    self.indent += 1;
                    self.print_block(else_block);
                    self.indent -= 1;
                }
                self.line("end");
            }
            ExprKind::MethodCall {
                block: Some(block), ..
            } if block.body.statements.len() > 1 => {
                // Multi-statement blocks print in do/end form; the call
                // head is rendered without its block.
                let mut head_expr = expr.clone();
                if let ExprKind::MethodCall { block: slot, .. } = &mut head_expr.kind {
                    *slot = None;
                }
                let head = expr_text(&head_expr, 0);
                self.print_call_with_block(&head, block);
            }
            _ => {
                let text = expr_text(expr, 0);
                self.line(&text);
            }
        }
    }

    fn print_call_with_block(&mut self, head: &str, block: &BlockArg) {
        let params = if block.params.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = block.params.iter().map(|p| p.name.as_str()).collect();
            format!(" |{}|", names.join(", "))
        };
        self.line(&format!("{head} do{params}"));
        self.indent += 1;
        self.print_block(&block.body);
        self.indent -= 1;
        self.line("end");
    }
}

/// Statements joined with `;` for single-line compound forms.
fn block_expr_text(block: &Block) -> String {
    block
        .statements
        .iter()
        .map(|s| expr_text(s, 0))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `{ |a, b| stmt; stmt }` single-line block rendering.
fn inline_block_text(block: &BlockArg) -> String {
    let params = if block.params.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = block.params.iter().map(|p| p.name.as_str()).collect();
        format!("|{}| ", names.join(", "))
    };
    let statements: Vec<String> = block
        .body
        .statements
        .iter()
        .map(|s| expr_text(s, 0))
        .collect();
    if statements.is_empty() {
        return format!(" {{ {params}}}");
    }
    format!(" {{ {params}{} }}", statements.join("; "))
}

fn param_text(param: &Param) -> String {
    let sigil = match param.kind {
        ParamKind::Splat => "*",
        ParamKind::DoubleSplat => "**",
        ParamKind::Block => "&",
        _ => "",
    };
    let mut text = format!("{sigil}{}", param.name);
    match param.kind {
        ParamKind::Keyword => text.push(':'),
        ParamKind::OptionalKeyword => {
            text.push_str(": ");
            if let Some(default) = &param.default {
                text.push_str(&expr_text(default, 0));
            }
        }
        ParamKind::OptionalPositional => {
            if let Some(default) = &param.default {
                text.push_str(&format!(" = {}", expr_text(default, 0)));
            }
        }
        _ => {}
    }
    text
}

/// Operator precedence for minimal parenthesization; higher binds
/// tighter.
fn precedence(op: BinOp) -> u8 {
    use BinOp::*;
    match op {
        Range | RangeExclusive => 1,
        Or => 2,
        And => 3,
        Eq | NotEq | Spaceship => 4,
        Lt | LtEq | Gt | GtEq => 5,
        BitOr | BitXor => 6,
        BitAnd => 7,
        Shl | Shr => 8,
        Add | Sub => 9,
        Mul | Div | Mod => 10,
        Pow => 11,
    }
}

/// Render an expression to text. `parent_prec` drives parenthesization
/// of nested binary operations.
fn expr_text(expr: &Expr, parent_prec: u8) -> String {
    match &expr.kind {
        ExprKind::Literal(value) => literal_text(value),
        ExprKind::Interpolation(parts) => {
            let mut out = String::from("\"");
            for part in parts {
                match part {
                    InterpolationPart::Str(text) => out.push_str(&escape(text)),
                    InterpolationPart::Expr(inner) => {
                        out.push_str("#{");
                        out.push_str(&expr_text(inner, 0));
                        out.push('}');
                    }
                }
            }
            out.push('"');
            out
        }
        ExprKind::VariableRef { name, scope } => match scope {
            ScopeKind::Instance => format!("@{name}"),
            ScopeKind::Class => format!("@@{name}"),
            ScopeKind::Global => format!("${name}"),
            _ => name.clone(),
        },
        ExprKind::Assignment { target, value, .. } => {
            format!("{} = {}", expr_text(target, 0), expr_text(value, 0))
        }
        ExprKind::Binary { op, left, right } => {
            let prec = precedence(*op);
            let text = format!(
                "{} {} {}",
                expr_text(left, prec),
                op.symbol(),
                expr_text(right, prec + 1)
            );
            if prec < parent_prec {
                format!("({text})")
            } else {
                text
            }
        }
        ExprKind::Unary { op, operand } => {
            let symbol = match op {
                UnOp::Neg => "-",
                UnOp::Not => "!",
            };
            format!("{symbol}{}", expr_text(operand, u8::MAX))
        }
        ExprKind::MethodCall {
            receiver,
            method,
            args,
            kwargs,
            block,
        } => {
            let mut out = String::new();
            if let Some(receiver) = receiver {
                out.push_str(&expr_text(receiver, u8::MAX));
                out.push('.');
            }
            out.push_str(method);
            let mut rendered: Vec<String> = args.iter().map(|a| expr_text(a, 0)).collect();
            rendered.extend(
                kwargs
                    .iter()
                    .map(|(name, value)| format!("{name}: {}", expr_text(value, 0))),
            );
            if !rendered.is_empty() {
                out.push_str(&format!("({})", rendered.join(", ")));
            }
            if let Some(block_arg) = block {
                out.push_str(&inline_block_text(block_arg));
            }
            out
        }
        ExprKind::SafeNavigation {
            receiver,
            method,
            args,
        } => {
            let mut out = format!("{}&.{method}", expr_text(receiver, u8::MAX));
            if !args.is_empty() {
                let rendered: Vec<String> = args.iter().map(|a| expr_text(a, 0)).collect();
                out.push_str(&format!("({})", rendered.join(", ")));
            }
            out
        }
        ExprKind::Index { receiver, args } => {
            let rendered: Vec<String> = args.iter().map(|a| expr_text(a, 0)).collect();
            format!("{}[{}]", expr_text(receiver, u8::MAX), rendered.join(", "))
        }
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
            negated,
        } => {
            // Expression position: ternary when both branches are single
            // expressions, modifier form for a bare single-statement
            // body, full single-line `if ... then ... else ... end`
            // otherwise.
            if let (false, [then_expr], Some(else_block)) =
                (*negated, then_branch.statements.as_slice(), else_branch)
                && let [else_expr] = else_block.statements.as_slice()
            {
                return format!(
                    "{} ? {} : {}",
                    expr_text(condition, u8::MAX),
                    expr_text(then_expr, u8::MAX),
                    expr_text(else_expr, u8::MAX)
                );
            }
            let keyword = if *negated { "unless" } else { "if" };
            if let ([only], None) = (then_branch.statements.as_slice(), else_branch) {
                return format!(
                    "{} {keyword} {}",
                    expr_text(only, 0),
                    expr_text(condition, 0)
                );
            }
            let mut out = format!("{keyword} {} then", expr_text(condition, 0));
            if !then_branch.statements.is_empty() {
                out.push(' ');
                out.push_str(&block_expr_text(then_branch));
            }
            if let Some(else_block) = else_branch {
                out.push_str(" else");
                if !else_block.statements.is_empty() {
                    out.push(' ');
                    out.push_str(&block_expr_text(else_block));
                }
            }
            out.push_str(" end");
            out
        }
        ExprKind::Case {
            scrutinee,
            arms,
            else_branch,
        } => {
            // Single-line `case ... when ... then ... end` form.
            let mut out = String::from("case");
            if let Some(scrutinee) = scrutinee {
                out.push(' ');
                out.push_str(&expr_text(scrutinee, 0));
            }
            for (patterns, body) in arms {
                let printed: Vec<String> = patterns.iter().map(|p| expr_text(p, 0)).collect();
                out.push_str(&format!(" when {} then", printed.join(", ")));
                if !body.statements.is_empty() {
                    out.push(' ');
                    out.push_str(&block_expr_text(body));
                }
            }
            if let Some(else_block) = else_branch {
                out.push_str(" else");
                if !else_block.statements.is_empty() {
                    out.push(' ');
                    out.push_str(&block_expr_text(else_block));
                }
            }
            out.push_str(" end");
            out
        }
        ExprKind::While {
            condition,
            body,
            negated,
        } => {
            let keyword = if *negated { "until" } else { "while" };
            let mut out = format!("{keyword} {} do", expr_text(condition, 0));
            if !body.statements.is_empty() {
                out.push(' ');
                out.push_str(&block_expr_text(body));
            }
            out.push_str(" end");
            out
        }
        ExprKind::Return { value } => match value {
            Some(value) => format!("return {}", expr_text(value, 0)),
            None => "return".to_string(),
        },
        ExprKind::Raise { value } => match value {
            Some(value) => format!("raise {}", expr_text(value, 0)),
            None => "raise".to_string(),
        },
        ExprKind::Lambda { params, body } => {
            let params = if params.is_empty() {
                String::new()
            } else {
                let parts: Vec<String> = params.iter().map(param_text).collect();
                format!("({})", parts.join(", "))
            };
            let statements: Vec<String> =
                body.statements.iter().map(|s| expr_text(s, 0)).collect();
            format!("->{params} {{ {} }}", statements.join("; "))
        }
        ExprKind::ArrayLiteral(elements) => {
            let rendered: Vec<String> = elements.iter().map(|e| expr_text(e, 0)).collect();
            format!("[{}]", rendered.join(", "))
        }
        ExprKind::HashLiteral(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    if let ExprKind::Literal(LiteralValue::Symbol(name)) = &key.kind {
                        format!("{name}: {}", expr_text(value, 0))
                    } else {
                        format!("{} => {}", expr_text(key, 0), expr_text(value, 0))
                    }
                })
                .collect();
            format!("{{ {} }}", rendered.join(", "))
        }
        // Assertions are type-only; print the underlying expression.
        ExprKind::TypeAssertion { expr: inner, .. } => expr_text(inner, parent_prec),
        ExprKind::Raw { text } => text.clone(),
    }
}

fn literal_text(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Str(text) => format!("\"{}\"", escape(text)),
        LiteralValue::Int(value) => value.to_string(),
        LiteralValue::Float(value) => {
            if value.fract() == 0.0 && value.is_finite() {
                format!("{value:.1}")
            } else {
                value.to_string()
            }
        }
        LiteralValue::Bool(value) => value.to_string(),
        LiteralValue::Symbol(name) => format!(":{name}"),
        LiteralValue::Nil => "nil".to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '#' => out.push_str("\\#"),
            other => out.push(other),
        }
    }
    out
}
