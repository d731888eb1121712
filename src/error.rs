//! Error type of the file-based compiler API.
//!
//! The core stages never raise: they collect diagnostics. This type is
//! the outer boundary where fatal conditions become a Rust error for the
//! file-based entry points. The string-based entry points catch
//! everything and report through their result structure instead.

use std::path::PathBuf;
use trb_common::Diagnostic;

#[derive(Debug)]
pub enum CompileError {
    /// Reading input or writing output failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The source did not parse; no output was produced.
    Parse(Vec<Diagnostic>),
    /// Analysis produced fatal diagnostics; no output was produced.
    Check(Vec<Diagnostic>),
    /// The configuration file is invalid.
    Config(String),
    /// A `.d.trb` declaration could not be found on the search path.
    DeclarationNotFound(String),
}

impl CompileError {
    /// The diagnostics behind this error, when there are any.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Parse(diags) | CompileError::Check(diags) => diags,
            _ => &[],
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Io { path, source } => {
                write!(f, "{}: {source}", path.display())
            }
            CompileError::Parse(diags) => {
                write!(f, "{} parse error(s)", diags.iter().filter(|d| d.is_error()).count())
            }
            CompileError::Check(diags) => {
                write!(f, "{} error(s)", diags.iter().filter(|d| d.is_error()).count())
            }
            CompileError::Config(message) => write!(f, "invalid configuration: {message}"),
            CompileError::DeclarationNotFound(name) => {
                write!(f, "no declaration file found for `{name}`")
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
