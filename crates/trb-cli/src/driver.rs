//! The compilation driver.
//!
//! Loads the project configuration, applies CLI overrides, discovers
//! inputs and compiles them. Files compile independently and in
//! parallel; a fatal error in one file never affects its siblings.

use crate::args::CliArgs;
use crate::{fs, reporter};
use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use trb::compiler::Compiler;
use trb::config::TrbConfig;
use trb_common::diagnostics::Severity;

/// Outcome of one driver run.
#[derive(Debug, Clone, Default)]
pub struct DriveOutcome {
    pub compiled: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Rendered diagnostic text, one entry per file with output.
    pub reports: Vec<String>,
}

impl DriveOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.errors > 0)
    }
}

/// Locate and load the configuration: an explicit `--project` path, or a
/// `trbconfig.yml` in the current directory, or the defaults.
pub fn load_config(args: &CliArgs) -> Result<(TrbConfig, Vec<trb_common::Diagnostic>)> {
    let (mut config, warnings) = match &args.project {
        Some(path) => {
            let file = if path.is_dir() {
                path.join("trbconfig.yml")
            } else {
                path.clone()
            };
            TrbConfig::load(&file)?
        }
        None => {
            let default_path = Path::new("trbconfig.yml");
            if default_path.is_file() {
                TrbConfig::load(default_path)?
            } else {
                (TrbConfig::default(), Vec::new())
            }
        }
    };
    args.apply_overrides(&mut config);
    Ok((config, warnings))
}

/// Run one full compilation over the configured inputs.
pub fn run(args: &CliArgs) -> Result<DriveOutcome> {
    let (config, config_warnings) = load_config(args)?;
    let files = fs::discover_files(&config, &args.inputs)?;

    if config.output.clean_before_build {
        for dir in [&config.output.ruby_dir, &config.output.rbs_dir] {
            let path = Path::new(dir);
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            }
        }
    }

    let compiler = Compiler::new(config);
    let mut outcome = compile_files(&compiler, &files);
    outcome.warnings += config_warnings.len();
    for warning in &config_warnings {
        outcome
            .reports
            .insert(0, format!("trbconfig.yml: warning[{}]: {}\n", warning.code, warning.message));
    }
    Ok(outcome)
}

/// Compile a file list with the given compiler, in parallel.
#[must_use]
pub fn compile_files(compiler: &Compiler, files: &[PathBuf]) -> DriveOutcome {
    let results: Vec<(usize, usize, Option<String>)> = files
        .par_iter()
        .map(|path| compile_one(compiler, path))
        .collect();

    let mut outcome = DriveOutcome::default();
    for (errors, warnings, report) in results {
        if errors == 0 {
            outcome.compiled += 1;
        }
        outcome.errors += errors;
        outcome.warnings += warnings;
        if let Some(report) = report {
            outcome.reports.push(report);
        }
    }
    outcome
}

fn compile_one(compiler: &Compiler, path: &Path) -> (usize, usize, Option<String>) {
    let source = std::fs::read_to_string(path).unwrap_or_default();
    match compiler.compile_file(path) {
        Ok(paths) => {
            if paths.diagnostics.is_empty() {
                return (0, 0, None);
            }
            let warnings = paths
                .diagnostics
                .iter()
                .filter(|d| !d.is_error())
                .count();
            let report = reporter::render_diagnostics(path, &source, &paths.diagnostics);
            (0, warnings, Some(report))
        }
        Err(error) => {
            let diagnostics = error.diagnostics();
            if diagnostics.is_empty() {
                return (1, 0, Some(format!("{}: {error}\n", path.display())));
            }
            let errors = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count();
            let warnings = diagnostics.len() - errors;
            let report = reporter::render_diagnostics(path, &source, diagnostics);
            (errors, warnings, Some(report))
        }
    }
}
