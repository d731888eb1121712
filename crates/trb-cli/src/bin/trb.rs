//! The `trb` binary.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trb_cli::args::CliArgs;
use trb_cli::{driver, fs, reporter, watch};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("TRB_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("trb: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> anyhow::Result<ExitCode> {
    if args.show_config {
        let (config, _) = driver::load_config(args)?;
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    if args.list_files {
        let (config, _) = driver::load_config(args)?;
        for file in fs::discover_files(&config, &args.inputs)? {
            println!("{}", file.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.watch {
        watch::run(args, |report| print!("{report}"))?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = driver::run(args)?;
    for report in &outcome.reports {
        print!("{report}");
    }
    println!(
        "{}",
        reporter::render_summary(outcome.compiled, outcome.errors, outcome.warnings)
    );
    Ok(if outcome.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
