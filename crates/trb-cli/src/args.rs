//! CLI arguments for the `trb` binary.

use clap::Parser;
use std::path::PathBuf;
use trb::config::TrbConfig;
use trb_common::Strictness;

#[derive(Parser, Debug, Default)]
#[command(name = "trb", version, about = "trb - a typed Ruby compiler")]
pub struct CliArgs {
    /// Input files or directories. When empty, the project configuration
    /// drives file discovery.
    pub inputs: Vec<PathBuf>,

    /// Path to trbconfig.yml or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Watch input files and recompile on changes.
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Treat every type diagnostic as an error.
    #[arg(long, conflicts_with = "permissive")]
    pub strict: bool,

    /// Demote type diagnostics to warnings.
    #[arg(long)]
    pub permissive: bool,

    /// Skip `.rbs` signature output.
    #[arg(long = "no-rbs")]
    pub no_rbs: bool,

    /// Also emit `.d.trb` declaration files.
    #[arg(long)]
    pub declaration: bool,

    /// Run the IR optimizer before emission (regenerates formatting).
    #[arg(long)]
    pub optimize: bool,

    /// Override the runtime output directory.
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Override the signature output directory.
    #[arg(long = "rbs-dir")]
    pub rbs_dir: Option<PathBuf>,

    /// Print the resolved configuration and exit.
    #[arg(long = "show-config")]
    pub show_config: bool,

    /// Print the files that would be compiled and exit.
    #[arg(long = "list-files")]
    pub list_files: bool,
}

impl CliArgs {
    /// Fold command-line overrides into a loaded configuration.
    pub fn apply_overrides(&self, config: &mut TrbConfig) {
        if self.strict {
            config.compiler.strictness = Strictness::Strict;
        }
        if self.permissive {
            config.compiler.strictness = Strictness::Permissive;
        }
        if self.no_rbs {
            config.compiler.generate_rbs = Some(false);
        }
        if self.optimize
            && !config.compiler.experimental.iter().any(|e| e == "optimizer")
        {
            config.compiler.experimental.push("optimizer".to_string());
        }
        if let Some(dir) = &self.out_dir {
            config.output.ruby_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(dir) = &self.rbs_dir {
            config.output.rbs_dir = dir.to_string_lossy().into_owned();
        }
    }
}
