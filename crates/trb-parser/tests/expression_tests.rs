//! Expression/body parser tests.

use trb_parser::{
    BinOp, Declaration, Expr, ExprKind, LiteralValue, ScopeKind, UnOp, parse_program,
};

/// Parse a body and return its statements.
fn parse_body(body: &str) -> Vec<Expr> {
    let source = format!("def probe\n{body}\nend\n");
    let result = parse_program(&source);
    assert!(
        !result.has_errors(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
    match result.program.declarations.into_iter().next() {
        Some(Declaration::Function(func)) => func.body.unwrap().statements,
        other => panic!("expected a function, got {other:?}"),
    }
}

fn parse_single(body: &str) -> Expr {
    let mut statements = parse_body(body);
    assert_eq!(statements.len(), 1, "expected one statement");
    statements.remove(0)
}

#[test]
fn parses_literals() {
    assert!(matches!(
        parse_single("42").kind,
        ExprKind::Literal(LiteralValue::Int(42))
    ));
    assert!(matches!(
        parse_single("3.5").kind,
        ExprKind::Literal(LiteralValue::Float(_))
    ));
    assert!(matches!(
        parse_single(":sym").kind,
        ExprKind::Literal(LiteralValue::Symbol(_))
    ));
    assert!(matches!(
        parse_single("nil").kind,
        ExprKind::Literal(LiteralValue::Nil)
    ));
}

#[test]
fn string_literal_is_unescaped() {
    let expr = parse_single("\"a\\nb\"");
    let ExprKind::Literal(LiteralValue::Str(s)) = expr.kind else {
        panic!("expected string literal");
    };
    assert_eq!(s, "a\nb");
}

#[test]
fn binary_precedence_multiplication_over_addition() {
    let expr = parse_single("1 + 2 * 3");
    let ExprKind::Binary { op, right, .. } = expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(op, BinOp::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Binary { op: BinOp::Mul, .. }
    ));
}

#[test]
fn comparison_produces_binary_node() {
    let expr = parse_single("a < b");
    assert!(matches!(
        expr.kind,
        ExprKind::Binary { op: BinOp::Lt, .. }
    ));
}

#[test]
fn unary_minus_and_not() {
    assert!(matches!(
        parse_single("-x").kind,
        ExprKind::Unary { op: UnOp::Neg, .. }
    ));
    assert!(matches!(
        parse_single("!ready").kind,
        ExprKind::Unary { op: UnOp::Not, .. }
    ));
}

#[test]
fn assignment_and_compound_assignment() {
    let expr = parse_single("x = 1");
    let ExprKind::Assignment { target, value, .. } = expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        target.kind,
        ExprKind::VariableRef { scope: ScopeKind::Local, .. }
    ));
    assert!(matches!(value.kind, ExprKind::Literal(LiteralValue::Int(1))));

    // `x += 1` desugars to `x = x + 1`.
    let expr = parse_single("x += 1");
    let ExprKind::Assignment { value, .. } = expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        ExprKind::Binary { op: BinOp::Add, .. }
    ));
}

#[test]
fn typed_local_assignment_records_annotation() {
    let expr = parse_single("count: Integer = 0");
    let ExprKind::Assignment {
        declared_type,
        annotation_span,
        ..
    } = expr.kind
    else {
        panic!("expected assignment");
    };
    assert!(declared_type.is_some());
    assert!(annotation_span.is_some());
}

#[test]
fn instance_variable_assignment() {
    let expr = parse_single("@name = value");
    let ExprKind::Assignment { target, .. } = expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        target.kind,
        ExprKind::VariableRef { scope: ScopeKind::Instance, .. }
    ));
}

#[test]
fn method_call_with_receiver_and_args() {
    let expr = parse_single("user.rename(\"x\", 2)");
    let ExprKind::MethodCall {
        receiver,
        method,
        args,
        ..
    } = expr.kind
    else {
        panic!("expected call");
    };
    assert!(receiver.is_some());
    assert_eq!(method, "rename");
    assert_eq!(args.len(), 2);
}

#[test]
fn method_call_with_keyword_args() {
    let expr = parse_single("create(name: \"a\", age: 3)");
    let ExprKind::MethodCall { kwargs, args, .. } = expr.kind else {
        panic!("expected call");
    };
    assert!(args.is_empty());
    assert_eq!(kwargs.len(), 2);
    assert_eq!(kwargs[0].0, "name");
}

#[test]
fn unparenthesized_call_arguments() {
    let expr = parse_single("puts \"hello\"");
    let ExprKind::MethodCall { method, args, .. } = expr.kind else {
        panic!("expected call");
    };
    assert_eq!(method, "puts");
    assert_eq!(args.len(), 1);
}

#[test]
fn call_chain_is_left_associative() {
    let expr = parse_single("s.strip.upcase");
    let ExprKind::MethodCall { receiver, method, .. } = expr.kind else {
        panic!("expected call");
    };
    assert_eq!(method, "upcase");
    assert!(matches!(
        receiver.unwrap().kind,
        ExprKind::MethodCall { .. }
    ));
}

#[test]
fn block_argument_with_pipes() {
    let expr = parse_single("items.map { |x| x * 2 }");
    let ExprKind::MethodCall { block, .. } = expr.kind else {
        panic!("expected call");
    };
    let block = block.expect("block argument");
    assert_eq!(block.params.len(), 1);
    assert_eq!(block.params[0].name, "x");
    assert_eq!(block.body.statements.len(), 1);
}

#[test]
fn do_end_block_argument() {
    let statements = parse_body("items.each do |item|\n  puts item\nend");
    let ExprKind::MethodCall { ref block, .. } = statements[0].kind else {
        panic!("expected call");
    };
    assert!(block.is_some());
}

#[test]
fn safe_navigation() {
    let expr = parse_single("user&.name");
    assert!(matches!(expr.kind, ExprKind::SafeNavigation { .. }));
}

#[test]
fn index_access() {
    let expr = parse_single("arr[0]");
    let ExprKind::Index { args, .. } = expr.kind else {
        panic!("expected index");
    };
    assert_eq!(args.len(), 1);
}

#[test]
fn if_with_elsif_lowers_to_nested_if() {
    let expr = parse_single("if a\n  1\nelsif b\n  2\nelse\n  3\nend");
    let ExprKind::If { else_branch, .. } = expr.kind else {
        panic!("expected if");
    };
    let else_block = else_branch.expect("else branch");
    assert_eq!(else_block.statements.len(), 1);
    let ExprKind::If { else_branch: inner_else, .. } = &else_block.statements[0].kind else {
        panic!("expected nested if for elsif");
    };
    assert!(inner_else.is_some());
}

#[test]
fn unless_sets_the_negated_flag() {
    let expr = parse_single("unless done\n  work\nend");
    assert!(matches!(expr.kind, ExprKind::If { negated: true, .. }));
}

#[test]
fn postfix_if_modifier() {
    let expr = parse_single("return 1 if ready");
    let ExprKind::If { then_branch, .. } = expr.kind else {
        panic!("expected if");
    };
    assert!(matches!(
        then_branch.statements[0].kind,
        ExprKind::Return { .. }
    ));
}

#[test]
fn ternary_lowers_to_if() {
    let expr = parse_single("x > 0 ? \"pos\" : \"neg\"");
    let ExprKind::If { else_branch, .. } = expr.kind else {
        panic!("expected if from ternary");
    };
    assert!(else_branch.is_some());
}

#[test]
fn case_when_arms() {
    let expr = parse_single("case n\nwhen 1, 2\n  :low\nwhen 3\n  :mid\nelse\n  :high\nend");
    let ExprKind::Case {
        scrutinee,
        arms,
        else_branch,
    } = expr.kind
    else {
        panic!("expected case");
    };
    assert!(scrutinee.is_some());
    assert_eq!(arms.len(), 2);
    assert_eq!(arms[0].0.len(), 2);
    assert!(else_branch.is_some());
}

#[test]
fn while_and_until_loops() {
    assert!(matches!(
        parse_single("while x < 3\n  bump\nend").kind,
        ExprKind::While { negated: false, .. }
    ));
    assert!(matches!(
        parse_single("until done\n  step\nend").kind,
        ExprKind::While { negated: true, .. }
    ));
}

#[test]
fn string_interpolation_parts() {
    let expr = parse_single("\"Hello, #{name}!\"");
    let ExprKind::Interpolation(parts) = expr.kind else {
        panic!("expected interpolation");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], trb_parser::InterpolationPart::Str(s) if s == "Hello, "));
    assert!(matches!(&parts[1], trb_parser::InterpolationPart::Expr(_)));
    assert!(matches!(&parts[2], trb_parser::InterpolationPart::Str(s) if s == "!"));
}

#[test]
fn array_and_hash_literals() {
    assert!(matches!(
        parse_single("[1, 2, 3]").kind,
        ExprKind::ArrayLiteral(ref elements) if elements.len() == 3
    ));
    let expr = parse_single("{name: \"a\", \"k\" => 1}");
    let ExprKind::HashLiteral(entries) = expr.kind else {
        panic!("expected hash");
    };
    assert_eq!(entries.len(), 2);
    assert!(matches!(
        entries[0].0.kind,
        ExprKind::Literal(LiteralValue::Symbol(_))
    ));
}

#[test]
fn lambda_literal() {
    let expr = parse_single("->(x: Integer) { x * 2 }");
    let ExprKind::Lambda { params, body } = expr.kind else {
        panic!("expected lambda");
    };
    assert_eq!(params.len(), 1);
    assert!(params[0].ty.is_some());
    assert_eq!(body.statements.len(), 1);
}

#[test]
fn type_assertion_parses() {
    let expr = parse_single("value as Integer");
    assert!(matches!(expr.kind, ExprKind::TypeAssertion { .. }));
}

#[test]
fn raise_with_class_and_message() {
    let expr = parse_single("raise ArgumentError, \"bad\"");
    let ExprKind::Raise { value } = expr.kind else {
        panic!("expected raise");
    };
    let value = value.expect("exception value");
    assert!(matches!(value.kind, ExprKind::MethodCall { ref method, .. } if method == "new"));
}

#[test]
fn bare_return() {
    let expr = parse_single("return");
    assert!(matches!(expr.kind, ExprKind::Return { value: None }));
}

#[test]
fn unknown_syntax_becomes_raw_passthrough() {
    let statements = parse_body("x = 1\n^&weird *stuff\ny = 2");
    assert_eq!(statements.len(), 3);
    assert!(statements
        .iter()
        .any(|s| matches!(s.kind, ExprKind::Raw { .. })));
}

#[test]
fn terminator_analysis() {
    let ret = parse_single("return 1");
    assert!(ret.is_terminator());
    let cond = parse_single("if a\n  return 1\nelse\n  return 2\nend");
    assert!(cond.is_terminator());
    let partial = parse_single("if a\n  return 1\nend");
    assert!(!partial.is_terminator());
}
