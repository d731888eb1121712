//! Type inference and checking for the trb typed-Ruby compiler.
//!
//! The solver walks the parsed IR and assigns a type to every expression
//! node. It is flow-based: assignments introduce or refine entries in a
//! lexically scoped environment, method return types are the union of
//! every explicit `return` plus the implicit value of the body's last
//! expression, and unions are canonicalized by the IR's smart
//! constructors.
//!
//! Nothing here raises for a type mismatch. Diagnostics are collected and
//! their severity is mapped by the configured strictness; the driver
//! decides what is fatal.

pub mod aliases;
pub mod builtins;
pub mod constraints;
pub mod env;
pub mod infer;
pub mod subtype;

pub use aliases::{AliasError, TypeAliasRegistry};
pub use env::TypeEnv;
pub use infer::{SolveResult, Solver, TypeCache, check_program};
pub use subtype::{DeclTable, SubtypeChecker};

#[cfg(test)]
#[path = "tests/type_law_tests.rs"]
mod type_law_tests;
#[cfg(test)]
#[path = "tests/alias_registry_tests.rs"]
mod alias_registry_tests;
