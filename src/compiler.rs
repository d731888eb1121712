//! The compiler façade.
//!
//! One object ties the pipeline together. File-based entry points raise
//! [`CompileError`] on I/O problems and fatal diagnostics; the
//! string-based entry point never fails and reports everything through
//! its result structure (the contract the playground relies on).
//!
//! No partial output: emission happens only after every analysis stage
//! succeeded. Writes are atomic (temp file, then rename) and output
//! directories are created on demand.

use crate::CompileError;
use crate::config::TrbConfig;
use std::path::{Path, PathBuf};
use trb_common::diagnostics::{Diagnostic, sort_diagnostics};
use trb_common::CompilerOptions;
use trb_emitter::transforms::Optimizer;
use trb_parser::Program;
use trb_solver::SolveResult;

/// Result of one successful [`Compiler::compile_file`] call: the written
/// paths plus any non-fatal diagnostics (warnings) the analysis produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPaths {
    pub ruby: PathBuf,
    pub rbs: Option<PathBuf>,
    pub declaration: Option<PathBuf>,
    /// Warning-severity diagnostics for a file that still compiled.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of the in-memory entry point. Never an `Err`: syntax and type
/// problems land in `errors`, and the outputs are present only when
/// nothing fatal occurred.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub runtime: Option<String>,
    pub signature: Option<String>,
    pub errors: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Whether compilation produced runtime output.
    #[must_use]
    pub fn success(&self) -> bool {
        self.runtime.is_some()
    }
}

/// The compiler façade. Cheap to clone; safe to use from multiple
/// threads as long as each compilation works on its own file.
#[derive(Debug, Clone)]
pub struct Compiler {
    config: TrbConfig,
    options: CompilerOptions,
    declaration_paths: Vec<PathBuf>,
}

impl Compiler {
    #[must_use]
    pub fn new(config: TrbConfig) -> Self {
        let options = config.resolved_options();
        Compiler {
            config,
            options,
            declaration_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrbConfig {
        &self.config
    }

    #[must_use]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Add a directory to the `.d.trb` search path.
    pub fn add_declaration_path(&mut self, path: impl Into<PathBuf>) {
        self.declaration_paths.push(path.into());
    }

    // ==================== Entry points ====================

    /// Compile one file to disk. Returns the written paths.
    pub fn compile_file(&self, input: &Path) -> Result<CompiledPaths, CompileError> {
        let source = read_file(input)?;
        let (program, solved) = self.analyze(&source)?;

        let runtime = self.emit_runtime(&source, &program);
        let ruby_path = self.output_path(input, &self.config.output.ruby_dir, "rb");
        write_atomic(&ruby_path, &runtime)?;

        let mut rbs_path = None;
        if self.options.generate_rbs {
            let signature = trb_emitter::emit_rbs(&program, &solved);
            let path = self.output_path(input, &self.config.output.rbs_dir, "rbs");
            write_atomic(&path, &signature)?;
            rbs_path = Some(path);
        }

        let mut declaration_path = None;
        if self.options.generate_declarations {
            let declarations = trb_emitter::emit_declarations(&program, &solved);
            let path = self.output_path(input, &self.config.output.rbs_dir, "d.trb");
            write_atomic(&path, &declarations)?;
            declaration_path = Some(path);
        }

        tracing::debug!(input = %input.display(), output = %ruby_path.display(), "compiled file");
        Ok(CompiledPaths {
            ruby: ruby_path,
            rbs: rbs_path,
            declaration: declaration_path,
            diagnostics: solved.diagnostics,
        })
    }

    /// Compile a source string in memory. Never fails; see
    /// [`CompileOutput`].
    #[must_use]
    pub fn compile_string(&self, source: &str) -> CompileOutput {
        let parsed = trb_parser::parse_program(source);
        let mut errors = parsed.diagnostics.clone();
        if parsed.has_errors() {
            sort_diagnostics(&mut errors);
            return CompileOutput {
                runtime: None,
                signature: None,
                errors,
            };
        }

        let solved = trb_solver::check_program(&parsed.program, self.options.clone());
        errors.extend(solved.diagnostics.iter().cloned());
        sort_diagnostics(&mut errors);
        if solved.has_errors() {
            return CompileOutput {
                runtime: None,
                signature: None,
                errors,
            };
        }

        let runtime = self.emit_runtime(source, &parsed.program);
        let signature = self
            .options
            .generate_rbs
            .then(|| trb_emitter::emit_rbs(&parsed.program, &solved));
        CompileOutput {
            runtime: Some(runtime),
            signature,
            errors,
        }
    }

    /// Parse and analyze a file, returning the IR for external tooling.
    pub fn compile_to_ir(&self, input: &Path) -> Result<Program, CompileError> {
        let source = read_file(input)?;
        let (program, _) = self.analyze(&source)?;
        Ok(program)
    }

    /// Emit from an already-built IR, skipping parsing. The runtime text
    /// is regenerated from the IR (there is no source to preserve).
    pub fn compile_from_ir(
        &self,
        program: &Program,
        output_path: &Path,
    ) -> Result<PathBuf, CompileError> {
        let solved = trb_solver::check_program(program, self.options.clone());
        if solved.has_errors() {
            return Err(CompileError::Check(solved.diagnostics));
        }
        let runtime = trb_emitter::print_program(program);
        write_atomic(output_path, &runtime)?;
        Ok(output_path.to_path_buf())
    }

    /// Look up a `.d.trb` declaration file by name on the search path.
    pub fn load_declaration(&self, name: &str) -> Result<Program, CompileError> {
        for dir in &self.declaration_paths {
            let candidate = dir.join(format!("{name}.d.trb"));
            if candidate.is_file() {
                let source = read_file(&candidate)?;
                let parsed = trb_parser::parse_declaration_program(&source);
                if parsed.has_errors() {
                    return Err(CompileError::Parse(parsed.diagnostics));
                }
                return Ok(parsed.program);
            }
        }
        Err(CompileError::DeclarationNotFound(name.to_string()))
    }

    // ==================== Pipeline pieces ====================

    /// Parse and check; fatal diagnostics abort. On success the returned
    /// result carries every remaining (warning-severity) diagnostic.
    fn analyze(&self, source: &str) -> Result<(Program, SolveResult), CompileError> {
        let parsed = trb_parser::parse_program(source);
        if parsed.has_errors() {
            return Err(CompileError::Parse(parsed.diagnostics));
        }
        let mut solved = trb_solver::check_program(&parsed.program, self.options.clone());
        if solved.has_errors() {
            let mut diagnostics = parsed.diagnostics;
            diagnostics.extend(solved.diagnostics);
            return Err(CompileError::Check(diagnostics));
        }
        if !parsed.diagnostics.is_empty() {
            solved.diagnostics.extend(parsed.diagnostics);
            sort_diagnostics(&mut solved.diagnostics);
        }
        Ok((parsed.program, solved))
    }

    /// Source-preserving erasure by default; regenerative printing when
    /// the optimizer has rewritten the IR.
    fn emit_runtime(&self, source: &str, program: &Program) -> String {
        if self.options.optimize {
            let (optimized, stats) = Optimizer::standard().run(program);
            for stat in &stats {
                tracing::debug!(
                    pass = stat.pass,
                    rewritten = stat.rewritten,
                    eliminated = stat.eliminated,
                    "optimizer pass"
                );
            }
            trb_emitter::print_program(&optimized)
        } else {
            trb_emitter::erase_types(source, program)
        }
    }

    /// Where output for `input` goes: the configured directory, with the
    /// source-relative path mirrored under it when `preserve_structure`
    /// is set.
    fn output_path(&self, input: &Path, out_dir: &str, extension: &str) -> PathBuf {
        let file_name = input.with_extension(extension);
        let relative = if self.config.output.preserve_structure {
            self.strip_source_root(&file_name)
        } else {
            file_name
                .file_name()
                .map(PathBuf::from)
                .unwrap_or(file_name.clone())
        };
        Path::new(out_dir).join(relative)
    }

    fn strip_source_root(&self, path: &Path) -> PathBuf {
        for include in &self.config.source.include {
            let root = Path::new(include);
            if let Ok(stripped) = path.strip_prefix(root) {
                return stripped.to_path_buf();
            }
        }
        path.file_name().map(PathBuf::from).unwrap_or_else(|| path.to_path_buf())
    }
}

fn read_file(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write via a temporary sibling then rename, so readers never observe a
/// half-written file. Parent directories are created on demand.
fn write_atomic(path: &Path, contents: &str) -> Result<(), CompileError> {
    let io_error = |source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, contents).map_err(io_error)?;
    std::fs::rename(&temp, path).map_err(io_error)?;
    Ok(())
}
