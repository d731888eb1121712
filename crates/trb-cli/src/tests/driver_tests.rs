use crate::args::CliArgs;
use crate::driver;

fn write(path: &std::path::Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn args_for(dir: &std::path::Path, inputs: Vec<std::path::PathBuf>) -> CliArgs {
    CliArgs {
        inputs,
        out_dir: Some(dir.join("build")),
        rbs_dir: Some(dir.join("sig")),
        ..CliArgs::default()
    }
}

#[test]
fn compiles_a_project_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("src/greeter.trb"),
        "def greet(name: String): String\n  name\nend\n",
    );
    write(
        &dir.path().join("src/math.trb"),
        "def double(n: Integer): Integer\n  n * 2\nend\n",
    );

    let args = args_for(dir.path(), vec![dir.path().join("src")]);
    let outcome = driver::run(&args).expect("driver runs");
    assert_eq!(outcome.compiled, 2);
    assert_eq!(outcome.errors, 0);
    assert_eq!(outcome.exit_code(), 0);
    assert!(dir.path().join("build").is_dir());
    assert!(dir.path().join("sig").is_dir());
}

#[test]
fn a_broken_file_does_not_stop_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/ok.trb"), "def ok: Integer\n  1\nend\n");
    write(&dir.path().join("src/bad.trb"), "def (((\n");

    let args = args_for(dir.path(), vec![dir.path().join("src")]);
    let outcome = driver::run(&args).expect("driver runs");
    assert_eq!(outcome.compiled, 1);
    assert!(outcome.errors > 0);
    assert_eq!(outcome.exit_code(), 1);
    assert!(!outcome.reports.is_empty());
}

#[test]
fn type_errors_fail_the_run_in_standard_mode() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("src/bad_types.trb"),
        "def label: String\n  42\nend\n",
    );

    let args = args_for(dir.path(), vec![dir.path().join("src")]);
    let outcome = driver::run(&args).expect("driver runs");
    assert!(outcome.errors > 0);
}

#[test]
fn permissive_mode_compiles_through_type_warnings() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("src/bad_types.trb"),
        "def label: String\n  42\nend\n",
    );

    let mut args = args_for(dir.path(), vec![dir.path().join("src")]);
    args.permissive = true;
    let outcome = driver::run(&args).expect("driver runs");
    assert_eq!(outcome.errors, 0);
    assert_eq!(outcome.compiled, 1);
    // The demoted mismatch still shows up as a warning with a report.
    assert!(outcome.warnings > 0);
    assert!(!outcome.reports.is_empty());
}

#[test]
fn project_config_file_drives_discovery() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("lib/a.trb"), "def a: Integer\n  1\nend\n");
    write(
        &dir.path().join("trbconfig.yml"),
        &format!(
            "source:\n  include:\n    - {}\noutput:\n  ruby_dir: {}\n  rbs_dir: {}\n",
            dir.path().join("lib").display(),
            dir.path().join("build").display(),
            dir.path().join("sig").display(),
        ),
    );

    let args = CliArgs {
        project: Some(dir.path().join("trbconfig.yml")),
        ..CliArgs::default()
    };
    let outcome = driver::run(&args).expect("driver runs");
    assert_eq!(outcome.compiled, 1);
}
