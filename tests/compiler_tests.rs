//! End-to-end compiler tests over the façade: the seven canonical
//! scenarios, the never-raise contract of the string entry point,
//! deterministic output, and file-based compilation with atomic writes.

use std::path::Path;
use trb::compiler::Compiler;
use trb::config::TrbConfig;

fn compiler() -> Compiler {
    Compiler::new(TrbConfig::default())
}

fn compile(source: &str) -> (String, String) {
    let output = compiler().compile_string(source);
    assert!(
        output.errors.iter().all(|e| !e.is_error()),
        "unexpected errors: {:?}",
        output.errors
    );
    (
        output.runtime.expect("runtime output"),
        output.signature.expect("signature output"),
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_basic_function() {
    let (runtime, signature) =
        compile("def greet(name: String): String\n  \"Hello, #{name}\"\nend\n");
    assert_eq!(runtime, "def greet(name)\n  \"Hello, #{name}\"\nend\n");
    assert_eq!(signature.trim(), "def greet: (String) -> String");
}

#[test]
fn scenario_implicit_return() {
    let (_, signature) = compile("def shout(s: String)\n  s.upcase\nend\n");
    assert_eq!(signature.trim(), "def shout: (String) -> String");
}

#[test]
fn scenario_constructor_returns_void() {
    let (runtime, signature) = compile(
        "class User\n  def initialize(name: String)\n    @name = name\n  end\nend\n",
    );
    assert!(runtime.contains("def initialize(name)"));
    assert!(signature.contains("class User"));
    assert!(signature.contains("def initialize: (String) -> void"));
}

#[test]
fn scenario_union_return_from_branches() {
    let (_, signature) = compile(
        "def lookup(id: Integer)\n  if id > 0\n    \"ok\"\n  else\n    nil\n  end\nend\n",
    );
    assert_eq!(signature.trim(), "def lookup: (Integer) -> (String | nil)");
}

#[test]
fn scenario_generic_function() {
    let (runtime, signature) = compile("def first<T>(arr: Array<T>): T\n  arr[0]\nend\n");
    assert_eq!(runtime, "def first(arr)\n  arr[0]\nend\n");
    assert_eq!(signature.trim(), "def first: [T] (Array[T]) -> T");
}

#[test]
fn scenario_type_alias() {
    let (runtime, signature) =
        compile("type UserId = Integer\ndef find(id: UserId): String\n  \"u-#{id}\"\nend\n");
    assert!(!runtime.contains("type UserId"));
    assert!(signature.contains("type UserId = Integer"));
    assert!(signature.contains("def find: (UserId) -> String"));
}

#[test]
fn scenario_interface_stripped_from_runtime() {
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
    let (runtime, signature) = compile(source);
    assert!(!runtime.contains("interface"));
    assert!(!runtime.contains("implements"));
    assert!(runtime.contains("class Doc"));
    assert!(runtime.contains("\"doc\""));
    assert!(signature.contains("interface Printable"));
    assert!(signature.contains("class Doc"));
}

// =============================================================================
// Contracts
// =============================================================================

#[test]
fn string_entry_point_never_raises() {
    for source in [
        "def (((",
        "class\n",
        "\"unterminated",
        "type A = A\n",
        "def f(x: Array<>)\nend\n",
    ] {
        let output = compiler().compile_string(source);
        assert!(
            !output.errors.is_empty(),
            "expected diagnostics for {source:?}"
        );
        assert!(output.runtime.is_none());
    }
}

#[test]
fn deterministic_output() {
    let source = "\
type Id = Integer

class Registry
  @entries: Hash<Id, String>

  def initialize
    @entries = {}
  end

  def lookup(id: Id): String?
    @entries[id]
  end
end
";
    let first = compiler().compile_string(source);
    let second = compiler().compile_string(source);
    assert_eq!(first.runtime, second.runtime);
    assert_eq!(first.signature, second.signature);
}

#[test]
fn compile_file_writes_ruby_and_rbs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("greeter.trb");
    std::fs::write(&input, "def greet(name: String): String\n  name\nend\n").unwrap();

    let mut config = TrbConfig::default();
    config.output.ruby_dir = dir.path().join("build").to_string_lossy().into_owned();
    config.output.rbs_dir = dir.path().join("sig").to_string_lossy().into_owned();
    let compiler = Compiler::new(config);

    let paths = compiler.compile_file(&input).expect("compiles");
    assert!(paths.ruby.exists());
    let runtime = std::fs::read_to_string(&paths.ruby).unwrap();
    assert_eq!(runtime, "def greet(name)\n  name\nend\n");

    let rbs = paths.rbs.expect("rbs written");
    assert!(rbs.exists());
    let signature = std::fs::read_to_string(&rbs).unwrap();
    assert!(signature.contains("def greet: (String) -> String"));

    // No stray temp files from the atomic write.
    let leftovers: Vec<_> = walk(dir.path())
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn compile_file_surfaces_warnings_on_success() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("loose.trb");
    // In permissive mode the return mismatch is a warning, so the file
    // still compiles - but the diagnostic must not be dropped.
    std::fs::write(&input, "def label: String\n  42\nend\n").unwrap();

    let mut config = TrbConfig::default();
    config.compiler.strictness = trb::common::Strictness::Permissive;
    config.output.ruby_dir = dir.path().join("build").to_string_lossy().into_owned();
    config.output.rbs_dir = dir.path().join("sig").to_string_lossy().into_owned();
    let compiler = Compiler::new(config);

    let paths = compiler.compile_file(&input).expect("compiles with warnings");
    assert!(paths.ruby.exists());
    assert!(!paths.diagnostics.is_empty());
    assert!(paths.diagnostics.iter().all(|d| !d.is_error()));
    assert!(paths.diagnostics.iter().any(|d| d.code
        == trb::common::diagnostics::codes::RETURN_TYPE_MISMATCH));
}

#[test]
fn compile_file_missing_input_is_an_io_error() {
    let result = compiler().compile_file(Path::new("no/such/file.trb"));
    assert!(matches!(result, Err(trb::CompileError::Io { .. })));
}

#[test]
fn compile_file_parse_error_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("broken.trb");
    std::fs::write(&input, "def (((\n").unwrap();

    let mut config = TrbConfig::default();
    config.output.ruby_dir = dir.path().join("build").to_string_lossy().into_owned();
    config.output.rbs_dir = dir.path().join("sig").to_string_lossy().into_owned();
    let compiler = Compiler::new(config);

    let result = compiler.compile_file(&input);
    assert!(matches!(result, Err(trb::CompileError::Parse(_))));
    assert!(!dir.path().join("build").exists());
    assert!(!dir.path().join("sig").exists());
}

#[test]
fn compile_to_ir_returns_the_program() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("lib.trb");
    std::fs::write(&input, "def one: Integer\n  1\nend\n").unwrap();

    let program = compiler().compile_to_ir(&input).expect("ir");
    assert!(program.function("one").is_some());
}

#[test]
fn compile_from_ir_regenerates_runtime() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("lib.trb");
    std::fs::write(&input, "def two: Integer\n  1 + 1\nend\n").unwrap();

    let facade = compiler();
    let program = facade.compile_to_ir(&input).expect("ir");
    let output = dir.path().join("out.rb");
    facade.compile_from_ir(&program, &output).expect("emit");
    let runtime = std::fs::read_to_string(&output).unwrap();
    assert_eq!(runtime, "def two\n  1 + 1\nend\n");
}

#[test]
fn load_declaration_searches_the_configured_paths() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("json.d.trb"),
        "module Json\n  def self.parse(text: String): any\nend\n",
    )
    .unwrap();

    let mut facade = compiler();
    facade.add_declaration_path(dir.path());
    let program = facade.load_declaration("json").expect("found");
    assert_eq!(program.declarations.len(), 1);

    let missing = facade.load_declaration("yaml");
    assert!(matches!(
        missing,
        Err(trb::CompileError::DeclarationNotFound(_))
    ));
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.extend(walk(&path));
            } else {
                found.push(path);
            }
        }
    }
    found
}
