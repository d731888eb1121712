use super::*;

#[test]
fn successful_compile_produces_both_outputs() {
    let output = compile_source(
        "def greet(name: String): String\n  \"Hello, #{name}\"\nend\n",
        Strictness::Standard,
    );
    assert!(output.success);
    assert_eq!(
        output.runtime.as_deref(),
        Some("def greet(name)\n  \"Hello, #{name}\"\nend\n")
    );
    assert!(output.signature.unwrap().contains("def greet: (String) -> String"));
    assert!(output.errors.is_empty());
}

#[test]
fn syntax_errors_are_reported_not_raised() {
    let output = compile_source("def (((\n", Strictness::Standard);
    assert!(!output.success);
    assert!(output.runtime.is_none());
    assert!(!output.errors.is_empty());
    // Positions are 1-indexed editor coordinates.
    assert!(output.errors[0].line >= 1);
    assert!(output.errors[0].column >= 1);
}

#[test]
fn type_errors_respect_strictness() {
    let source = "def label: String\n  42\nend\n";
    let strict = compile_source(source, Strictness::Strict);
    assert!(!strict.success);
    assert!(strict.errors.iter().any(|e| e.severity == "error"));

    let permissive = compile_source(source, Strictness::Permissive);
    assert!(permissive.success);
    assert!(permissive.errors.iter().all(|e| e.severity == "warning"));
}

#[test]
fn output_serializes_to_json() {
    let output = compile_source("def one: Integer\n  1\nend\n", Strictness::Standard);
    let json = serde_json::to_string(&output).expect("serializable");
    assert!(json.contains("\"success\":true"));
    assert!(json.contains("\"runtime\""));
}
