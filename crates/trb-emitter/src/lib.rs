//! Emitters and IR transforms for the trb compiler.
//!
//! Two runtime-emission strategies:
//! - [`erase::erase_types`] edits the original source text through the
//!   annotation spans recorded by the parser, preserving every byte of
//!   formatting and every comment. This is the default.
//! - [`printer::print_program`] regenerates canonical Ruby from the IR.
//!   Used after the optimizer has rewritten the tree, when the original
//!   spans no longer describe the program.
//!
//! The signature emitter ([`rbs`]) and the declaration emitter
//! ([`declaration`]) both walk the IR in source order, so output is
//! deterministic.

pub mod declaration;
pub mod erase;
pub mod printer;
pub mod rbs;
pub mod transforms;

pub use declaration::emit_declarations;
pub use erase::erase_types;
pub use printer::print_program;
pub use rbs::emit_rbs;
pub use transforms::{Optimizer, TransformStats};
