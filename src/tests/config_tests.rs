use super::*;
use trb_common::Strictness;

#[test]
fn defaults_are_sensible() {
    let config = TrbConfig::default();
    assert_eq!(config.source.extensions, vec![".trb".to_string()]);
    assert_eq!(config.output.ruby_dir, "build");
    assert_eq!(config.output.rbs_dir, "sig");
    assert!(config.output.preserve_structure);
    let options = config.resolved_options();
    assert_eq!(options.strictness, Strictness::Standard);
    assert!(options.generate_rbs);
}

#[test]
fn parses_a_full_document() {
    let (config, warnings) = TrbConfig::parse(
        "\
source:
  include:
    - src
  exclude:
    - \"**/fixtures/**\"
output:
  ruby_dir: out/ruby
  rbs_dir: out/sig
  preserve_structure: false
compiler:
  strictness: strict
  generate_rbs: true
  target_language_version: \"3.2\"
  checks:
    implicit_any: true
    unused_vars: true
  experimental:
    - optimizer
",
    )
    .expect("config should parse");
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(config.source.include, vec!["src".to_string()]);
    assert_eq!(config.output.ruby_dir, "out/ruby");
    assert!(!config.output.preserve_structure);

    let options = config.resolved_options();
    assert_eq!(options.strictness, Strictness::Strict);
    assert!(options.checks.implicit_any);
    assert!(options.checks.unused_vars);
    assert!(options.optimize);
    assert!(options.experiment("optimizer"));
}

#[test]
fn unknown_keys_warn_but_do_not_fail() {
    let (_, warnings) = TrbConfig::parse(
        "\
source:
  include: [src]
  includes: [oops]
outputs:
  ruby_dir: x
compiler:
  checks:
    strict_null: true
",
    )
    .expect("unknown keys are not fatal");
    let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(warnings.len(), 3, "warnings: {messages:?}");
    assert!(messages.iter().any(|m| m.contains("source.includes")));
    assert!(messages.iter().any(|m| m.contains("`outputs`")));
    assert!(messages.iter().any(|m| m.contains("compiler.checks.strict_null")));
}

#[test]
fn malformed_values_are_errors() {
    let result = TrbConfig::parse("compiler:\n  strictness: sloppy\n");
    assert!(matches!(result, Err(crate::CompileError::Config(_))));
}

#[test]
fn strict_mode_turns_on_the_check_family() {
    let (config, _) = TrbConfig::parse("compiler:\n  strictness: strict\n").unwrap();
    let options = config.resolved_options();
    assert!(options.checks.implicit_any);
    assert!(options.checks.strict_nil);
}

#[test]
fn target_version_parses() {
    let (config, _) =
        TrbConfig::parse("compiler:\n  target_language_version: \"2.7\"\n").unwrap();
    let options = config.resolved_options();
    assert!(!options.target.supports_endless_methods());
}
