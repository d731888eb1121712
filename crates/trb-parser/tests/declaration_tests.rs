//! Declaration parser tests: functions, classes, modules, interfaces,
//! aliases, constants and annotation-span recording.

use trb_parser::{Declaration, ParamKind, Visibility, parse_program};

fn single_function(source: &str) -> trb_parser::FunctionDecl {
    let result = parse_program(source);
    assert!(
        !result.has_errors(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
    match result.program.declarations.first() {
        Some(Declaration::Function(func)) => func.clone(),
        other => panic!("expected a function, got {other:?}"),
    }
}

fn single_class(source: &str) -> trb_parser::ClassDecl {
    let result = parse_program(source);
    assert!(
        !result.has_errors(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
    match result.program.declarations.first() {
        Some(Declaration::Class(class)) => class.clone(),
        other => panic!("expected a class, got {other:?}"),
    }
}

#[test]
fn parses_an_annotated_function() {
    let func = single_function("def greet(name: String): String\n  \"Hello\"\nend\n");
    assert_eq!(func.name, "greet");
    assert_eq!(func.params.len(), 1);
    assert_eq!(func.params[0].name, "name");
    assert_eq!(func.params[0].kind, ParamKind::Positional);
    assert!(func.params[0].ty.is_some());
    assert!(func.return_type.is_some());
    assert_eq!(func.body.as_ref().unwrap().statements.len(), 1);
}

#[test]
fn records_annotation_spans_for_erasure() {
    let source = "def greet(name: String): String\n  \"Hello\"\nend\n";
    let func = single_function(source);

    let param_span = func.params[0].annotation_span.expect("param annotation");
    assert_eq!(param_span.slice(source), ": String");

    let ret_span = func.return_annotation_span.expect("return annotation");
    assert_eq!(ret_span.slice(source), ": String");
}

#[test]
fn parses_parameter_kinds() {
    let func = single_function(
        "def f(a: Integer, b: Integer = 1, c = 2, key:, opt: 3, *rest, **extra, &blk)\nend\n",
    );
    let kinds: Vec<ParamKind> = func.params.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ParamKind::Positional,
            ParamKind::OptionalPositional,
            ParamKind::OptionalPositional,
            ParamKind::Keyword,
            ParamKind::OptionalKeyword,
            ParamKind::Splat,
            ParamKind::DoubleSplat,
            ParamKind::Block,
        ]
    );
}

#[test]
fn duplicate_parameter_names_are_reported() {
    let result = parse_program("def f(a: Integer, a: String)\nend\n");
    assert!(result.diagnostics.iter().any(|d| d.code
        == trb_common::diagnostics::codes::DUPLICATE_PARAMETER));
}

#[test]
fn untyped_parameters_are_accepted() {
    let func = single_function("def shout(s)\n  s\nend\n");
    assert!(func.params[0].ty.is_none());
    assert!(func.params[0].annotation_span.is_none());
}

#[test]
fn parses_generic_function_with_bound() {
    let func = single_function("def max_of<T: Comparable>(a: T, b: T): T\n  a\nend\n");
    assert_eq!(func.generics.len(), 1);
    assert_eq!(func.generics[0].name, "T");
    assert!(func.generics[0].bound.is_some());
    assert!(func.generics_span.is_some());
}

#[test]
fn generics_span_covers_the_angle_list() {
    let source = "def first<T>(arr: Array<T>): T\n  arr[0]\nend\n";
    let func = single_function(source);
    assert_eq!(func.generics_span.unwrap().slice(source), "<T>");
}

#[test]
fn parses_singleton_methods() {
    let func = single_function("def self.build(name: String): self\n  new\nend\n");
    assert!(func.singleton);
    assert_eq!(func.name, "build");
}

#[test]
fn parses_operator_method_names() {
    let func = single_function("def +(other: Money): Money\n  other\nend\n");
    assert_eq!(func.name, "+");
}

#[test]
fn parses_setter_method_names() {
    let func = single_function("def name=(value: String)\n  @name = value\nend\n");
    assert_eq!(func.name, "name=");
}

#[test]
fn parses_class_with_everything() {
    let source = "\
class User < Base
  include Comparable
  implements Printable

  @name: String
  @@count: Integer

  attr_reader :name

  def initialize(name: String)
    @name = name
  end

  private

  def secret: String
    \"s\"
  end
end
";
    let class = single_class(source);
    assert_eq!(class.name, "User");
    assert_eq!(class.parent.as_deref(), Some("Base"));
    assert_eq!(class.includes, vec!["Comparable".to_string()]);
    assert_eq!(class.implements, vec!["Printable".to_string()]);
    assert_eq!(class.ivars.len(), 1);
    assert_eq!(class.ivars[0].name, "name");
    assert_eq!(class.cvars.len(), 1);
    assert_eq!(class.attrs.len(), 1);
    assert_eq!(class.attrs[0].names, vec!["name".to_string()]);

    let init = class.method("initialize").expect("initialize");
    assert_eq!(init.visibility, Visibility::Public);
    let secret = class.method("secret").expect("secret");
    assert_eq!(secret.visibility, Visibility::Private);
}

#[test]
fn implements_clause_span_covers_the_clause() {
    let source = "class Doc\n  implements Printable, Comparable\nend\n";
    let class = single_class(source);
    assert_eq!(class.implements.len(), 2);
    assert_eq!(
        class.implements_spans[0].slice(source),
        "implements Printable, Comparable"
    );
}

#[test]
fn generic_class_with_superclass() {
    let class = single_class("class Box<T> < Container\nend\n");
    assert_eq!(class.generics.len(), 1);
    assert_eq!(class.parent.as_deref(), Some("Container"));
}

#[test]
fn parses_module_with_members() {
    let result = parse_program("module Util\n  def helper: Integer\n    1\n  end\nend\n");
    assert!(!result.has_errors());
    let Some(Declaration::Module(module)) = result.program.declarations.first() else {
        panic!("expected module");
    };
    assert_eq!(module.name, "Util");
    assert_eq!(module.members.len(), 1);
}

#[test]
fn parses_interface_declaration() {
    let source = "\
interface Printable
  def to_s: String
  def print(out: String): nil
end
";
    let result = parse_program(source);
    assert!(!result.has_errors());
    let Some(Declaration::Interface(iface)) = result.program.declarations.first() else {
        panic!("expected interface");
    };
    assert_eq!(iface.name, "Printable");
    assert_eq!(iface.methods.len(), 2);
    assert_eq!(iface.methods[0].name, "to_s");
    assert!(iface.methods[0].return_type.is_some());
    assert_eq!(iface.methods[1].params.len(), 1);
    // Interfaces are indexed on the program.
    assert!(result.program.interfaces.contains_key("Printable"));
}

#[test]
fn parses_type_alias() {
    let result = parse_program("type UserId = Integer\n");
    assert!(!result.has_errors());
    assert!(result.program.aliases.contains_key("UserId"));
    let alias = &result.program.aliases["UserId"];
    assert_eq!(alias.target.to_string(), "Integer");
}

#[test]
fn parses_generic_type_alias() {
    let result = parse_program("type Pair<A, B> = Hash<A, B>\n");
    assert!(!result.has_errors());
    let alias = &result.program.aliases["Pair"];
    assert_eq!(alias.generics.len(), 2);
}

#[test]
fn parses_typed_constant() {
    let source = "MAX_USERS: Integer = 100\n";
    let result = parse_program(source);
    assert!(!result.has_errors());
    let Some(Declaration::Constant(constant)) = result.program.declarations.first() else {
        panic!("expected constant");
    };
    assert_eq!(constant.name, "MAX_USERS");
    assert!(constant.ty.is_some());
    assert_eq!(
        constant.annotation_span.unwrap().slice(source),
        ": Integer"
    );
}

#[test]
fn declarations_preserve_source_order() {
    let source = "\
type Id = Integer

def a\nend

class B\nend

def c\nend
";
    let result = parse_program(source);
    let names: Vec<_> = result
        .program
        .declarations
        .iter()
        .filter_map(|d| d.name().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["Id", "a", "B", "c"]);
}

#[test]
fn malformed_declaration_recovers_to_next_line() {
    let source = "def 123\ndef ok\nend\n";
    let result = parse_program(source);
    assert!(result.has_errors());
    // The parser still finds the following function.
    assert!(result.program.function("ok").is_some());
}

#[test]
fn spans_nest_within_parents() {
    let source = "class User\n  def greet(name: String): String\n    name\n  end\nend\n";
    let class = single_class(source);
    let method = class.method("greet").unwrap();
    assert!(class.span.contains_span(method.span));
    assert!(method.span.contains_span(method.params[0].span));
    assert!(method.span.contains_span(method.body.as_ref().unwrap().span));
}
