//! Diagnostic reporting.
//!
//! One line per diagnostic, `path:line:col: severity[code]: message`,
//! severity colored, followed by a summary line.

use colored::Colorize;
use std::path::Path;
use trb_common::diagnostics::{Diagnostic, Severity};
use trb_common::LineMap;

/// Render one file's diagnostics against its source text.
#[must_use]
pub fn render_diagnostics(path: &Path, source: &str, diagnostics: &[Diagnostic]) -> String {
    let line_map = LineMap::build(source);
    let mut out = String::new();
    for diag in diagnostics {
        let severity = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        let offset = if diag.span.is_dummy() { 0 } else { diag.span.start };
        let position = line_map.position(offset.min(source.len() as u32), source);
        out.push_str(&format!(
            "{}:{position}: {severity}[{}]: {}\n",
            path.display(),
            diag.code,
            diag.message
        ));
        if let Some(hint) = &diag.hint {
            out.push_str(&format!("  {} {hint}\n", "hint:".cyan()));
        }
    }
    out
}

/// The closing summary line for a whole run.
#[must_use]
pub fn render_summary(compiled: usize, errors: usize, warnings: usize) -> String {
    let status = if errors > 0 {
        "failed".red().bold().to_string()
    } else {
        "ok".green().bold().to_string()
    };
    format!(
        "{status}: {compiled} file(s) compiled, {errors} error(s), {warnings} warning(s)"
    )
}
