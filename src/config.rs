//! `trbconfig.yml` loading.
//!
//! The file is read into a raw YAML document first so unknown keys can be
//! reported as warnings (never errors), then deserialized into the typed
//! structure. CLI flags override file settings downstream.

use serde::{Deserialize, Serialize};
use std::path::Path;
use trb_common::diagnostics::{Diagnostic, DiagnosticCategory, codes};
use trb_common::{CheckSettings, CompilerOptions, RubyTarget, Span, Strictness};

/// The `source.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directories/files to include.
    pub include: Vec<String>,
    /// Glob patterns to skip.
    pub exclude: Vec<String>,
    /// File suffixes treated as input.
    pub extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            include: vec![".".to_string()],
            exclude: Vec::new(),
            extensions: vec![".trb".to_string()],
        }
    }
}

/// The `output.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where runtime output is written.
    pub ruby_dir: String,
    /// Where signature output is written.
    pub rbs_dir: String,
    /// Mirror the source tree in output directories.
    pub preserve_structure: bool,
    /// Remove output directories before writing.
    pub clean_before_build: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            ruby_dir: "build".to_string(),
            rbs_dir: "sig".to_string(),
            preserve_structure: true,
            clean_before_build: false,
        }
    }
}

/// The `compiler.*` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub strictness: Strictness,
    pub generate_rbs: Option<bool>,
    pub target_language_version: Option<String>,
    pub checks: CheckSettings,
    pub experimental: Vec<String>,
}

/// The whole `trbconfig.yml` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrbConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub compiler: CompilerConfig,
}

impl TrbConfig {
    /// Load a configuration file, reporting unknown keys as warnings.
    pub fn load(path: &Path) -> Result<(TrbConfig, Vec<Diagnostic>), crate::CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| crate::CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse configuration text. Unknown keys become warnings; malformed
    /// values are an error.
    pub fn parse(text: &str) -> Result<(TrbConfig, Vec<Diagnostic>), crate::CompileError> {
        let raw: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|e| crate::CompileError::Config(e.to_string()))?;
        let mut warnings = Vec::new();
        check_unknown_keys(&raw, &mut warnings);
        let config: TrbConfig = serde_yaml::from_value(raw)
            .map_err(|e| crate::CompileError::Config(e.to_string()))?;
        Ok((config, warnings))
    }

    /// Resolve the file settings into the options the pipeline consumes.
    #[must_use]
    pub fn resolved_options(&self) -> CompilerOptions {
        let target = self
            .compiler
            .target_language_version
            .as_deref()
            .and_then(RubyTarget::parse)
            .unwrap_or_default();
        CompilerOptions {
            strictness: self.compiler.strictness,
            checks: self.compiler.checks,
            target,
            generate_rbs: self.compiler.generate_rbs.unwrap_or(true),
            generate_declarations: false,
            optimize: self.compiler.experimental.iter().any(|e| e == "optimizer"),
            experimental: self.compiler.experimental.clone(),
        }
        .apply_strictness_defaults()
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["source", "output", "compiler"];
const SOURCE_KEYS: &[&str] = &["include", "exclude", "extensions"];
const OUTPUT_KEYS: &[&str] = &[
    "ruby_dir",
    "rbs_dir",
    "preserve_structure",
    "clean_before_build",
];
const COMPILER_KEYS: &[&str] = &[
    "strictness",
    "generate_rbs",
    "target_language_version",
    "checks",
    "experimental",
];
const CHECK_KEYS: &[&str] = &["implicit_any", "unused_vars", "strict_nil"];

fn check_unknown_keys(raw: &serde_yaml::Value, warnings: &mut Vec<Diagnostic>) {
    let Some(top) = raw.as_mapping() else { return };
    warn_extra_keys(top, TOP_LEVEL_KEYS, "", warnings);
    for (section, keys) in [
        ("source", SOURCE_KEYS),
        ("output", OUTPUT_KEYS),
        ("compiler", COMPILER_KEYS),
    ] {
        if let Some(mapping) = top.get(section).and_then(serde_yaml::Value::as_mapping) {
            warn_extra_keys(mapping, keys, &format!("{section}."), warnings);
        }
    }
    if let Some(checks) = top
        .get("compiler")
        .and_then(serde_yaml::Value::as_mapping)
        .and_then(|c| c.get("checks"))
        .and_then(serde_yaml::Value::as_mapping)
    {
        warn_extra_keys(checks, CHECK_KEYS, "compiler.checks.", warnings);
    }
}

fn warn_extra_keys(
    mapping: &serde_yaml::Mapping,
    known: &[&str],
    prefix: &str,
    warnings: &mut Vec<Diagnostic>,
) {
    for key in mapping.keys() {
        let Some(name) = key.as_str() else { continue };
        if !known.contains(&name) {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticCategory::Config,
                    codes::UNKNOWN_CONFIG_KEY,
                    Span::dummy(),
                    format!("unknown configuration key `{prefix}{name}`"),
                )
                .in_file("trbconfig.yml"),
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
