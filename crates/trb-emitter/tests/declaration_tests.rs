//! `.d.trb` declaration emitter tests.

use trb_common::CompilerOptions;
use trb_emitter::emit_declarations;
use trb_parser::parse_program;
use trb_solver::check_program;

fn declarations(source: &str) -> String {
    let parsed = parse_program(source);
    assert!(
        !parsed.has_errors(),
        "parse diagnostics: {:?}",
        parsed.diagnostics
    );
    let solved = check_program(&parsed.program, CompilerOptions::default());
    emit_declarations(&parsed.program, &solved)
}

#[test]
fn functions_lose_their_bodies() {
    let output = declarations("def greet(name: String): String\n  \"Hello\"\nend\n");
    assert_eq!(output.trim(), "def greet(name: String): String");
}

#[test]
fn inferred_returns_are_made_explicit() {
    let output = declarations("def shout(s: String)\n  s.upcase\nend\n");
    assert_eq!(output.trim(), "def shout(s: String): String");
}

#[test]
fn classes_keep_type_structure_without_bodies() {
    let output = declarations(
        "\
class Box<T>
  @value: T

  def initialize(value: T)
    @value = value
  end

  def get: T
    @value
  end
end
",
    );
    let expected = "\
class Box<T>
  @value: T
  def initialize(value: T): void
  def get(): T
end
";
    assert_eq!(output, expected);
}

#[test]
fn private_members_are_omitted() {
    let output = declarations(
        "class C\n  def pub: Integer\n    1\n  end\n\n  private\n\n  def sec: Integer\n    2\n  end\nend\n",
    );
    assert!(output.contains("pub"));
    assert!(!output.contains("sec"));
}

#[test]
fn interfaces_and_aliases_are_kept_verbatim() {
    let output = declarations(
        "type UserId = Integer\n\ninterface Printable\n  def to_s: String\nend\n",
    );
    assert!(output.contains("type UserId = Integer"));
    assert!(output.contains("interface Printable"));
    assert!(output.contains("def to_s: String"));
}

#[test]
fn implements_clauses_are_preserved() {
    let output = declarations(
        "\
interface Printable
  def to_s: String
end

class Doc
  implements Printable

  def to_s: String
    \"doc\"
  end
end
",
    );
    assert!(output.contains("implements Printable"));
}

#[test]
fn constants_keep_their_types_but_not_values() {
    let output = declarations("MAX: Integer = 100\n");
    assert_eq!(output.trim(), "MAX: Integer");
}

#[test]
fn generic_bounds_survive() {
    let output = declarations(
        "interface Comparable\n  def compare(other: any): Integer\nend\n\ndef max_of<T: Comparable>(a: T, b: T): T\n  a\nend\n",
    );
    assert!(output.contains("def max_of<T: Comparable>(a: T, b: T): T"));
}
