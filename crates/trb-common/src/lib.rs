//! Common types and utilities for the trb typed-Ruby compiler.
//!
//! This crate provides foundational types used across all trb crates:
//! - Source spans (`Span`, `Spanned`, `SpanBuilder`)
//! - Line maps and positions for diagnostics rendering
//! - The diagnostic model (`Diagnostic`, `DiagnosticCategory`, `Severity`)
//! - Compiler options (`Strictness`, `CheckSettings`, `RubyTarget`)
//! - Comment extraction for source-preserving emission

// Span - source location tracking (byte offsets)
pub mod span;
pub use span::{Span, SpanBuilder, Spanned};

// Position/LineMap for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Diagnostic model shared by every pipeline stage
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, Severity, codes};

// Compiler options shared by solver, emitter and the driver
pub mod options;
pub use options::{CheckSettings, CompilerOptions, RubyTarget, Strictness};

// Comment extraction utilities
pub mod comments;
pub use comments::CommentRange;
