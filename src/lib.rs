//! trb - a typed-Ruby to Ruby + RBS source-to-source compiler.
//!
//! The pipeline is a straight line: scan, parse, infer, optionally
//! optimize, emit. Each stage lives in its own crate; this crate ties
//! them together behind the [`compiler::Compiler`] façade, loads
//! `trbconfig.yml`, and exposes the string-compilation entry point the
//! playground uses.
//!
//! ```no_run
//! use trb::compiler::Compiler;
//! use trb::config::TrbConfig;
//!
//! let compiler = Compiler::new(TrbConfig::default());
//! let output = compiler.compile_string("def one: Integer\n  1\nend\n");
//! assert!(output.errors.is_empty());
//! ```

// Pipeline crates, re-exported under stage names.
pub use trb_common as common;
pub use trb_emitter as emitter;
pub use trb_parser as parser;
pub use trb_scanner as scanner;
pub use trb_solver as solver;

pub mod compiler;
pub mod config;
pub mod error;
pub mod playground;

pub use compiler::{CompileOutput, CompiledPaths, Compiler};
pub use config::TrbConfig;
pub use error::CompileError;
