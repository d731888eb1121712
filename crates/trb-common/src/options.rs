//! Compiler options shared by the solver, the emitters and the driver.
//!
//! This module lives in trb-common so that the solver and the emitter can
//! both reference the option types without a circular dependency.

use serde::{Deserialize, Serialize};

/// How strictly the type checker treats mismatches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Every type diagnostic is an error; inference failures are fatal.
    Strict,
    /// Type mismatches are errors, missing annotations are accepted.
    #[default]
    Standard,
    /// Type diagnostics are demoted to warnings; untyped parameters get `any`.
    Permissive,
}

impl Strictness {
    /// Whether parameters may omit their type annotation.
    #[must_use]
    pub const fn allows_untyped_parameters(self) -> bool {
        !matches!(self, Strictness::Strict)
    }

    /// Whether type diagnostics abort compilation.
    #[must_use]
    pub const fn type_errors_fatal(self) -> bool {
        !matches!(self, Strictness::Permissive)
    }
}

/// Ruby language version the runtime emitter may target.
///
/// Controls which syntax the regenerative printer is allowed to produce
/// (e.g. endless method definitions appeared in 3.0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RubyTarget {
    Ruby26 = 0,
    Ruby27 = 1,
    #[default]
    Ruby30 = 2,
    Ruby31 = 3,
    Ruby32 = 4,
    Ruby33 = 5,
}

impl RubyTarget {
    /// Parse a version string like `"3.0"` from configuration.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "2.6" => Some(Self::Ruby26),
            "2.7" => Some(Self::Ruby27),
            "3.0" => Some(Self::Ruby30),
            "3.1" => Some(Self::Ruby31),
            "3.2" => Some(Self::Ruby32),
            "3.3" => Some(Self::Ruby33),
            _ => None,
        }
    }

    /// Whether the target supports endless method definitions (`def f = expr`).
    #[must_use]
    pub const fn supports_endless_methods(self) -> bool {
        (self as u8) >= (Self::Ruby30 as u8)
    }
}

/// Fine-grained check toggles (`compiler.checks.*` in trbconfig.yml).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CheckSettings {
    /// Report parameters that fall back to `any` in permissive mode.
    pub implicit_any: bool,
    /// Report local variables that are assigned but never read.
    pub unused_vars: bool,
    /// Report conditions that are statically `nil`.
    pub strict_nil: bool,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            implicit_any: false,
            unused_vars: false,
            strict_nil: true,
        }
    }
}

/// Resolved options handed to the pipeline for one compilation.
#[derive(Clone, Debug, Default)]
pub struct CompilerOptions {
    pub strictness: Strictness,
    pub checks: CheckSettings,
    pub target: RubyTarget,
    /// Emit `.rbs` signature output.
    pub generate_rbs: bool,
    /// Emit `.d.trb` declaration output.
    pub generate_declarations: bool,
    /// Run the IR optimizer before emission (forces regenerative output).
    pub optimize: bool,
    /// Experimental feature names enabled by configuration.
    pub experimental: Vec<String>,
}

impl CompilerOptions {
    /// Apply the strictness family defaults to individual check flags.
    /// `strict` turns on every check unless explicitly disabled later.
    #[must_use]
    pub fn apply_strictness_defaults(mut self) -> Self {
        if self.strictness == Strictness::Strict {
            self.checks.implicit_any = true;
            self.checks.strict_nil = true;
        }
        self
    }

    /// Whether a named experimental feature is enabled.
    #[must_use]
    pub fn experiment(&self, name: &str) -> bool {
        self.experimental.iter().any(|e| e == name)
    }
}
