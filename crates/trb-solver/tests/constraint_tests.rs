//! Constraint checker tests: generic bounds, arity, interface
//! conformance, intersection sanity.

use trb_common::CompilerOptions;
use trb_common::diagnostics::codes;
use trb_parser::parse_program;
use trb_solver::check_program;

fn solve(source: &str) -> trb_solver::SolveResult {
    let parsed = parse_program(source);
    assert!(
        !parsed.has_errors(),
        "parse diagnostics: {:?}",
        parsed.diagnostics
    );
    check_program(&parsed.program, CompilerOptions::default())
}

fn has_code(result: &trb_solver::SolveResult, code: u32) -> bool {
    result.diagnostics.iter().any(|d| d.code == code)
}

#[test]
fn conforming_implements_clause_passes() {
    let result = solve(
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
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
}

#[test]
fn missing_interface_method_is_reported() {
    let result = solve(
        "\
interface Printable
  def to_s: String
end

class Doc
  implements Printable
end
",
    );
    assert!(has_code(&result, codes::MISSING_INTERFACE_METHOD));
}

#[test]
fn incompatible_return_type_is_reported() {
    let result = solve(
        "\
interface Printable
  def to_s: String
end

class Doc
  implements Printable

  def to_s: Integer
    1
  end
end
",
    );
    assert!(has_code(&result, codes::INCOMPATIBLE_INTERFACE_METHOD));
}

#[test]
fn contravariant_parameters_are_accepted() {
    // The implementation accepts a wider parameter type than required.
    let result = solve(
        "\
interface Writer
  def write(s: String): nil
end

class Sink
  implements Writer

  def write(s: String | Integer): nil
    nil
  end
end
",
    );
    assert!(
        !has_code(&result, codes::INCOMPATIBLE_INTERFACE_METHOD),
        "contravariant widening should be accepted: {:?}",
        result.diagnostics
    );
}

#[test]
fn narrowed_parameters_are_rejected() {
    // The implementation demands more than the interface promises.
    let result = solve(
        "\
interface Writer
  def write(s: String | Integer): nil
end

class Sink
  implements Writer

  def write(s: String): nil
    nil
  end
end
",
    );
    assert!(has_code(&result, codes::INCOMPATIBLE_INTERFACE_METHOD));
}

#[test]
fn undefined_interface_is_reported() {
    let result = solve("class Doc\n  implements Ghost\nend\n");
    assert!(has_code(&result, codes::UNDEFINED_INTERFACE));
}

#[test]
fn parent_interface_requirements_are_inherited() {
    let result = solve(
        "\
interface Readable
  def read: String
end

interface Stream
  include Readable
  def close: nil
end

class File
  implements Stream

  def close: nil
    nil
  end
end
",
    );
    // `read` comes from the parent interface and is missing.
    assert!(has_code(&result, codes::MISSING_INTERFACE_METHOD));
}

#[test]
fn generic_bound_violation_is_reported() {
    let result = solve(
        "\
interface Comparable
  def compare(other: any): Integer
end

class Sorted<T: Comparable>
  @items: Array<T>
end

class Opaque
end

def f(s: Sorted<Opaque>)
  s
end
",
    );
    assert!(has_code(&result, codes::CONSTRAINT_NOT_SATISFIED));
}

#[test]
fn generic_bound_satisfied_structurally() {
    // Plain conforms structurally even without an implements clause.
    let result = solve(
        "\
interface Printable
  def to_s: String
end

class Plain
  def to_s: String
    \"p\"
  end
end

class Box<T: Printable>
  @value: T
end

def f(b: Box<Plain>)
  b
end
",
    );
    assert!(
        !has_code(&result, codes::CONSTRAINT_NOT_SATISFIED),
        "structural conformance should satisfy the bound: {:?}",
        result.diagnostics
    );
}

#[test]
fn generic_arity_mismatch_is_reported() {
    let result = solve(
        "\
class Pair<A, B>
  @first: A
  @second: B
end

def f(p: Pair<Integer>)
  p
end
",
    );
    assert!(has_code(&result, codes::GENERIC_ARITY_MISMATCH));
}

#[test]
fn class_class_intersection_is_rejected() {
    let result = solve(
        "\
class A
end

class B
end

def f(x: A & B)
  x
end
",
    );
    assert!(has_code(&result, codes::CLASS_INTERSECTION));
}

#[test]
fn class_interface_intersection_is_accepted() {
    let result = solve(
        "\
interface Printable
  def to_s: String
end

class A
  def to_s: String
    \"a\"
  end
end

def f(x: A & Printable)
  x
end
",
    );
    assert!(
        !has_code(&result, codes::CLASS_INTERSECTION),
        "class & interface should be accepted: {:?}",
        result.diagnostics
    );
}
