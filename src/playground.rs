//! String-compilation wrapper for the web playground.
//!
//! The playground worker calls [`compile_source`] with the editor
//! contents and posts the result back over its message protocol. The
//! result is fully serializable; diagnostics carry line/column positions
//! so the front-end can mark the editor without re-deriving them.

use crate::compiler::Compiler;
use crate::config::TrbConfig;
use serde::{Deserialize, Serialize};
use trb_common::{LineMap, Severity, Strictness};

/// A diagnostic shaped for the playground front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundDiagnostic {
    pub severity: String,
    pub code: u32,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// The `compile-result` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundOutput {
    pub success: bool,
    pub runtime: Option<String>,
    pub signature: Option<String>,
    pub errors: Vec<PlaygroundDiagnostic>,
}

/// Compile a source string with the given strictness. Never fails.
#[must_use]
pub fn compile_source(code: &str, strictness: Strictness) -> PlaygroundOutput {
    let mut config = TrbConfig::default();
    config.compiler.strictness = strictness;
    let compiler = Compiler::new(config);
    let output = compiler.compile_string(code);

    let line_map = LineMap::build(code);
    let errors = output
        .errors
        .iter()
        .map(|diag| {
            let position = line_map.position(diag.span.start.min(code.len() as u32), code);
            PlaygroundDiagnostic {
                severity: match diag.severity {
                    Severity::Error => "error".to_string(),
                    Severity::Warning => "warning".to_string(),
                },
                code: diag.code,
                line: position.line,
                column: position.column,
                message: diag.message.clone(),
            }
        })
        .collect();

    PlaygroundOutput {
        success: output.success(),
        runtime: output.runtime,
        signature: output.signature,
        errors,
    }
}

#[cfg(test)]
#[path = "tests/playground_tests.rs"]
mod tests;
