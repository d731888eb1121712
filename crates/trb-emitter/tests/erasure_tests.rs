//! Source-preserving erasure tests: the runtime output differs from the
//! source only inside annotation spans and type-only declarations.

use trb_emitter::erase_types;
use trb_parser::parse_program;

fn erase(source: &str) -> String {
    let result = parse_program(source);
    assert!(
        !result.has_errors(),
        "parse diagnostics: {:?}",
        result.diagnostics
    );
    erase_types(source, &result.program)
}

#[test]
fn erases_parameter_and_return_annotations() {
    let source = "def greet(name: String): String\n  \"Hello, #{name}\"\nend\n";
    assert_eq!(erase(source), "def greet(name)\n  \"Hello, #{name}\"\nend\n");
}

#[test]
fn keeps_defaults_when_erasing_annotations() {
    let source = "def page(size: Integer = 20)\n  size\nend\n";
    assert_eq!(erase(source), "def page(size = 20)\n  size\nend\n");
}

#[test]
fn keyword_parameters_pass_through() {
    let source = "def f(key:, opt: 3)\n  key\nend\n";
    assert_eq!(erase(source), source);
}

#[test]
fn erases_generic_parameter_lists() {
    let source = "def first<T>(arr: Array<T>): T\n  arr[0]\nend\n";
    assert_eq!(erase(source), "def first(arr)\n  arr[0]\nend\n");
}

#[test]
fn erases_class_generics_and_variable_declarations() {
    let source = "\
class Box<T>
  @value: T

  def initialize(value: T)
    @value = value
  end
end
";
    let expected = "\
class Box

  def initialize(value)
    @value = value
  end
end
";
    assert_eq!(erase(source), expected);
}

#[test]
fn removes_interface_blocks_and_implements_clauses() {
    let source = "\
interface Printable
  def to_s: String
end

class Doc
  implements Printable

  def to_s: String
    \"doc\"
  end
end
";
    let output = erase(source);
    assert!(!output.contains("interface"));
    assert!(!output.contains("implements"));
    assert!(!output.contains("Printable"));
    assert!(output.contains("class Doc"));
    assert!(output.contains("def to_s\n"));
    assert!(output.contains("\"doc\""));
}

#[test]
fn removes_type_alias_lines() {
    let source = "type UserId = Integer\ndef find(id: UserId): String\n  \"u-#{id}\"\nend\n";
    assert_eq!(erase(source), "def find(id)\n  \"u-#{id}\"\nend\n");
}

#[test]
fn erases_constant_annotations_but_keeps_the_assignment() {
    let source = "MAX_USERS: Integer = 100\n";
    assert_eq!(erase(source), "MAX_USERS = 100\n");
}

#[test]
fn erases_typed_local_annotations() {
    let source = "def f\n  count: Integer = 0\n  count\nend\n";
    assert_eq!(erase(source), "def f\n  count = 0\n  count\nend\n");
}

#[test]
fn erases_type_assertions() {
    let source = "def f(x)\n  y = x as Integer\n  y\nend\n";
    assert_eq!(erase(source), "def f(x)\n  y = x\n  y\nend\n");
}

#[test]
fn preserves_comments_and_formatting() {
    let source = "\
# Greets the user.
def greet(name: String): String
  # interpolation below
  \"Hello, #{name}\"   # trailing
end
";
    let expected = "\
# Greets the user.
def greet(name)
  # interpolation below
  \"Hello, #{name}\"   # trailing
end
";
    assert_eq!(erase(source), expected);
}

#[test]
fn erases_lambda_parameter_annotations() {
    let source = "def f\n  double = ->(x: Integer) { x * 2 }\n  double\nend\n";
    assert_eq!(erase(source), "def f\n  double = ->(x) { x * 2 }\n  double\nend\n");
}

#[test]
fn nested_generic_annotations_erase_fully() {
    let source = "def f(index: Hash<String, Array<Integer>>)\n  index\nend\n";
    assert_eq!(erase(source), "def f(index)\n  index\nend\n");
}

#[test]
fn untouched_source_is_byte_identical() {
    let source = "def plain(a, b = 2)\n  a + b # sum\nend\n";
    assert_eq!(erase(source), source);
}
