//! End-to-end inference tests: parse a source, run the solver, inspect
//! inferred method returns and diagnostics.

use trb_common::{CompilerOptions, Strictness};
use trb_parser::ir::types::TypeExpr;
use trb_parser::{Declaration, parse_program};
use trb_solver::check_program;
use trb_common::Span;

fn named(name: &str) -> TypeExpr {
    TypeExpr::named(name, Span::dummy())
}

/// Parse, solve, and return the inferred/declared return type of the
/// named top-level function.
fn return_type_of(source: &str, function: &str) -> TypeExpr {
    let parsed = parse_program(source);
    assert!(
        !parsed.has_errors(),
        "parse diagnostics: {:?}",
        parsed.diagnostics
    );
    let result = check_program(&parsed.program, CompilerOptions::default());
    let func = parsed
        .program
        .function(function)
        .unwrap_or_else(|| panic!("function `{function}` not found"));
    result
        .method_returns
        .get(&func.id)
        .cloned()
        .unwrap_or_else(|| panic!("no return type recorded for `{function}`"))
}

fn solve(source: &str) -> trb_solver::SolveResult {
    let parsed = parse_program(source);
    assert!(
        !parsed.has_errors(),
        "parse diagnostics: {:?}",
        parsed.diagnostics
    );
    check_program(&parsed.program, CompilerOptions::default())
}

#[test]
fn implicit_return_of_last_expression() {
    let ty = return_type_of("def shout(s: String)\n  s.upcase\nend\n", "shout");
    assert_eq!(ty, named("String"));
}

#[test]
fn implicit_return_of_literal() {
    assert_eq!(return_type_of("def one\n  1\nend\n", "one"), named("Integer"));
    assert_eq!(
        return_type_of("def greeting\n  \"hi\"\nend\n", "greeting"),
        named("String")
    );
}

#[test]
fn interpolation_is_a_string() {
    let ty = return_type_of(
        "def greet(name: String)\n  \"Hello, #{name}\"\nend\n",
        "greet",
    );
    assert_eq!(ty, named("String"));
}

#[test]
fn union_return_from_branches() {
    let ty = return_type_of(
        "def lookup(id: Integer)\n  if id > 0\n    \"ok\"\n  else\n    nil\n  end\nend\n",
        "lookup",
    );
    assert_eq!(
        ty,
        trb_parser::union_of(vec![named("String"), named("nil")], Span::dummy())
    );
}

#[test]
fn if_without_else_adds_nil() {
    let ty = return_type_of(
        "def maybe(flag: bool)\n  if flag\n    \"yes\"\n  end\nend\n",
        "maybe",
    );
    assert_eq!(
        ty,
        trb_parser::union_of(vec![named("String"), named("nil")], Span::dummy())
    );
}

#[test]
fn explicit_returns_unify_with_implicit() {
    let ty = return_type_of(
        "def pick(flag: bool)\n  return 1 if flag\n  \"fallback\"\nend\n",
        "pick",
    );
    assert_eq!(
        ty,
        trb_parser::union_of(vec![named("Integer"), named("String")], Span::dummy())
    );
}

#[test]
fn terminating_branches_do_not_pollute_the_union() {
    let ty = return_type_of(
        "def strict_pick(flag: bool)\n  if flag\n    return \"a\"\n  else\n    return \"b\"\n  end\nend\n",
        "strict_pick",
    );
    assert_eq!(ty, named("String"));
}

#[test]
fn initialize_always_returns_void() {
    let source = "\
class User
  def initialize(name: String)
    @name = name
  end
end
";
    let parsed = parse_program(source);
    let result = check_program(&parsed.program, CompilerOptions::default());
    let Some(Declaration::Class(class)) = parsed.program.declarations.first() else {
        panic!("expected class");
    };
    let init = class.method("initialize").unwrap();
    assert_eq!(result.method_returns[&init.id], named("void"));
}

#[test]
fn declared_return_wins_and_is_checked() {
    // Compatible body: no diagnostics, declared type recorded.
    let ty = return_type_of("def label: String\n  \"x\"\nend\n", "label");
    assert_eq!(ty, named("String"));

    // Incompatible body: diagnostic raised.
    let result = solve("def label: String\n  42\nend\n");
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::RETURN_TYPE_MISMATCH));
}

#[test]
fn local_assignment_flows_types() {
    let ty = return_type_of("def compute\n  x = 10\n  y = x + 5\n  y\nend\n", "compute");
    assert_eq!(ty, named("Integer"));
}

#[test]
fn operator_table_types_arithmetic() {
    assert_eq!(
        return_type_of("def f(a: Integer, b: Integer)\n  a + b\nend\n", "f"),
        named("Integer")
    );
    assert_eq!(
        return_type_of("def f(a: Integer, b: Float)\n  a + b\nend\n", "f"),
        named("Float")
    );
    assert_eq!(
        return_type_of("def f(a: String, b: String)\n  a + b\nend\n", "f"),
        named("String")
    );
    assert_eq!(
        return_type_of("def f(a: Integer, b: Integer)\n  a == b\nend\n", "f"),
        named("bool")
    );
}

#[test]
fn builtin_catalog_types_stdlib_calls() {
    assert_eq!(
        return_type_of("def f(s: String)\n  s.length\nend\n", "f"),
        named("Integer")
    );
    assert_eq!(
        return_type_of("def f(s: String)\n  s.empty?\nend\n", "f"),
        named("bool")
    );
    assert_eq!(
        return_type_of("def f(xs: Array<Integer>)\n  xs.first\nend\n", "f"),
        named("Integer")
    );
}

#[test]
fn array_index_yields_the_element_type() {
    let ty = return_type_of("def f(xs: Array<String>)\n  xs[0]\nend\n", "f");
    assert_eq!(ty, named("String"));
}

#[test]
fn generic_function_returns_its_type_var() {
    let ty = return_type_of("def first<T>(arr: Array<T>): T\n  arr[0]\nend\n", "first");
    assert!(matches!(ty, TypeExpr::TypeVar { name, .. } if name == "T"));
}

#[test]
fn map_with_block_infers_element_transform() {
    let ty = return_type_of(
        "def f(xs: Array<Integer>)\n  xs.map { |x| x.to_s }\nend\n",
        "f",
    );
    let expected = TypeExpr::Named {
        name: "Array".to_string(),
        args: vec![named("String")],
        span: Span::dummy(),
    };
    assert_eq!(ty, expected);
}

#[test]
fn user_defined_method_call_uses_declared_return() {
    let source = "\
class Greeter
  def greeting: String
    \"hi\"
  end
end

def f(g: Greeter)
  g.greeting
end
";
    assert_eq!(return_type_of(source, "f"), named("String"));
}

#[test]
fn method_resolution_walks_parent_chain() {
    let source = "\
class Base
  def id: Integer
    1
  end
end

class Child < Base
end

def f(c: Child)
  c.id
end
";
    assert_eq!(return_type_of(source, "f"), named("Integer"));
}

#[test]
fn method_resolution_walks_included_modules() {
    let source = "\
module Named
  def display_name: String
    \"n\"
  end
end

class User
  include Named
end

def f(u: User)
  u.display_name
end
";
    assert_eq!(return_type_of(source, "f"), named("String"));
}

#[test]
fn new_returns_an_instance() {
    let source = "\
class User
  def initialize(name: String)
    @name = name
  end
end

def f
  User.new(\"a\")
end
";
    assert_eq!(return_type_of(source, "f"), named("User"));
}

#[test]
fn safe_navigation_is_optional() {
    let source = "def f(s: String?)\n  s&.upcase\nend\n";
    let ty = return_type_of(source, "f");
    assert_eq!(
        ty,
        trb_parser::union_of(vec![named("String"), named("nil")], Span::dummy())
    );
}

#[test]
fn type_alias_resolves_in_method_calls() {
    let source = "type Name = String\ndef f(n: Name)\n  n.upcase\nend\n";
    assert_eq!(return_type_of(source, "f"), named("String"));
}

#[test]
fn type_assertion_takes_the_target_type() {
    let ty = return_type_of("def f(x)\n  x as Integer\nend\n", "f");
    assert_eq!(ty, named("Integer"));
}

#[test]
fn raw_nodes_are_any() {
    let ty = return_type_of("def f\n  ^&mystery syntax\nend\n", "f");
    assert!(ty.is_any());
}

#[test]
fn cache_is_consistent_across_queries() {
    let parsed = parse_program("def f\n  1 + 2\nend\n");
    let result = check_program(&parsed.program, CompilerOptions::default());
    let Some(Declaration::Function(func)) = parsed.program.declarations.first() else {
        panic!("expected function");
    };
    let body = func.body.as_ref().unwrap();
    let id = body.statements[0].id;
    let first = result.types.get(id).cloned();
    let second = result.types.get(id).cloned();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn argument_count_mismatch_is_reported() {
    let result = solve("def f(a: Integer)\n  a\nend\n\ndef g\n  f(1, 2)\nend\n");
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::ARGUMENT_COUNT_MISMATCH));
}

#[test]
fn argument_type_mismatch_is_reported() {
    let result = solve("def f(a: Integer)\n  a\nend\n\ndef g\n  f(\"text\")\nend\n");
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::ARGUMENT_TYPE_MISMATCH));
}

#[test]
fn assignment_against_declared_type_is_checked() {
    let result = solve("def f\n  x: Integer = \"nope\"\n  x\nend\n");
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::TYPE_MISMATCH));
}

#[test]
fn permissive_mode_demotes_type_errors_to_warnings() {
    let parsed = parse_program("def label: String\n  42\nend\n");
    let options = CompilerOptions {
        strictness: Strictness::Permissive,
        ..CompilerOptions::default()
    };
    let result = check_program(&parsed.program, options);
    let mismatch = result
        .diagnostics
        .iter()
        .find(|d| d.code == trb_common::diagnostics::codes::RETURN_TYPE_MISMATCH)
        .expect("mismatch reported");
    assert!(!mismatch.is_error());
    assert!(!result.has_errors());
}

#[test]
fn cyclic_alias_is_a_resolution_error() {
    let parsed = parse_program("type A = B\ntype B = A\n");
    let result = check_program(&parsed.program, CompilerOptions::default());
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::CYCLIC_ALIAS));
}

#[test]
fn ivar_types_flow_from_declarations() {
    let source = "\
class User
  @name: String

  def name_length
    @name.length
  end
end

def f(u: User)
  u.name_length
end
";
    assert_eq!(return_type_of(source, "f"), named("Integer"));
}
