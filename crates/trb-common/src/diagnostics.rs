//! Diagnostic model shared by every pipeline stage.
//!
//! A diagnostic carries a severity, a category, a numeric code, the file it
//! was found in, the span it covers, a message and an optional hint. Stages
//! collect diagnostics into vectors; the driver sorts them by span before
//! reporting. Whether a given category is fatal depends on the configured
//! strictness (see [`crate::options::Strictness`]).

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// What kind of problem a diagnostic describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    /// Unrecognized or malformed syntax.
    Parse,
    /// Static type mismatch (annotation vs. inferred, argument vs. parameter, ...).
    Type,
    /// Undefined name, cyclic alias, missing interface method, generic arity.
    Resolution,
    /// File not found, permission denied, failed write.
    Io,
    /// Invalid or unknown configuration key.
    Config,
}

/// How serious a diagnostic is after strictness mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Path of the file the diagnostic was found in. Empty for string input.
    pub file: String,
    pub span: Span,
    pub message: String,
    /// Optional suggestion shown after the message.
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(
        category: DiagnosticCategory,
        code: u32,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            category,
            code,
            file: String::new(),
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(
        category: DiagnosticCategory,
        code: u32,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(category, code, span, message)
        }
    }

    /// Attach a hint to this diagnostic.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach the file path this diagnostic belongs to.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Downgrade an error to a warning (strictness mapping).
    pub fn demoted(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sort diagnostics by span, then by code, for deterministic reporting.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(a.span.end.cmp(&b.span.end))
            .then(a.code.cmp(&b.code))
    });
}

/// Numeric diagnostic codes.
///
/// 1xxx parse, 2xxx type, 3xxx resolution, 4xxx config and I/O. The numeric
/// space is stable so editors and tests can match on codes.
pub mod codes {
    // Parse errors
    pub const UNEXPECTED_TOKEN: u32 = 1001;
    pub const UNTERMINATED_STRING: u32 = 1002;
    pub const EXPECTED_TYPE: u32 = 1003;
    pub const EXPECTED_IDENTIFIER: u32 = 1004;
    pub const EXPECTED_END: u32 = 1005;
    pub const EMPTY_TYPE_ARGUMENTS: u32 = 1006;
    pub const UNTERMINATED_INTERPOLATION: u32 = 1007;
    pub const INVALID_PARAMETER: u32 = 1008;
    pub const DUPLICATE_PARAMETER: u32 = 1010;
    pub const INTERFACE_METHOD_WITH_BODY: u32 = 1012;
    pub const TUPLE_TYPES_UNSUPPORTED: u32 = 1014;

    // Type errors
    pub const TYPE_MISMATCH: u32 = 2001;
    pub const RETURN_TYPE_MISMATCH: u32 = 2002;
    pub const ARGUMENT_TYPE_MISMATCH: u32 = 2003;
    pub const ARGUMENT_COUNT_MISMATCH: u32 = 2004;
    pub const IMPLICIT_ANY: u32 = 2005;
    pub const CONSTRAINT_NOT_SATISFIED: u32 = 2006;
    pub const CONDITION_ALWAYS_NIL: u32 = 2007;
    pub const CLASS_INTERSECTION: u32 = 2008;
    pub const UNUSED_VARIABLE: u32 = 2009;

    // Resolution errors
    pub const UNDEFINED_NAME: u32 = 3001;
    pub const DUPLICATE_ALIAS: u32 = 3002;
    pub const CYCLIC_ALIAS: u32 = 3003;
    pub const MISSING_INTERFACE_METHOD: u32 = 3004;
    pub const INCOMPATIBLE_INTERFACE_METHOD: u32 = 3005;
    pub const GENERIC_ARITY_MISMATCH: u32 = 3006;
    pub const UNDEFINED_INTERFACE: u32 = 3007;
    pub const DUPLICATE_DECLARATION: u32 = 3008;
    pub const UNDEFINED_DECLARATION: u32 = 3009;

    // Config / IO
    pub const UNKNOWN_CONFIG_KEY: u32 = 4001;
    pub const INVALID_CONFIG_VALUE: u32 = 4002;
    pub const WRITE_FAILED: u32 = 4003;
}

/// Fill `{0}`-style placeholders in a message template.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "tests/diagnostics.rs"]
mod tests;
