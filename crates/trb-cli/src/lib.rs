//! Command-line support for the trb compiler.
//!
//! This crate provides the `trb` binary and its modules: argument
//! parsing, file discovery, the compilation driver, diagnostic reporting
//! and watch mode. All compilation goes through the `trb` library façade.

pub mod args;
pub mod driver;
pub mod fs;
pub mod reporter;
pub mod watch;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod driver_tests;
#[cfg(test)]
#[path = "tests/fs_tests.rs"]
mod fs_tests;
