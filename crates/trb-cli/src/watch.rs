//! Watch mode: recompile on change.
//!
//! A thin consumer of the compiler façade. Watches the include roots
//! (or the explicit inputs), debounces bursts of file-system events, and
//! recompiles the changed source files. Each iteration uses a fresh
//! `Compiler`, so no per-compilation state leaks between runs.

use crate::args::CliArgs;
use crate::{driver, fs, reporter};
use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Run the watch loop. Blocks until the watcher channel closes.
pub fn run(args: &CliArgs, mut on_report: impl FnMut(&str)) -> Result<()> {
    let (config, _) = driver::load_config(args)?;
    let roots: Vec<PathBuf> = if args.inputs.is_empty() {
        config.source.include.iter().map(PathBuf::from).collect()
    } else {
        args.inputs.clone()
    };

    let (sender, receiver) = mpsc::channel();
    let mut watcher =
        notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            if let Ok(event) = event {
                let _ = sender.send(event);
            }
        })
        .context("failed to create file watcher")?;
    for root in &roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
    }

    // Initial full build.
    let outcome = driver::run(args)?;
    report_outcome(&outcome, &mut on_report);

    while let Ok(first) = receiver.recv() {
        let mut changed: Vec<PathBuf> = first.paths;
        // Collect the rest of the burst.
        while let Ok(event) = receiver.recv_timeout(DEBOUNCE) {
            changed.extend(event.paths);
        }
        changed.sort();
        changed.dedup();
        let (config, _) = driver::load_config(args)?;
        let sources: Vec<PathBuf> = changed
            .into_iter()
            .filter(|p| {
                config
                    .source
                    .extensions
                    .iter()
                    .any(|ext| p.to_string_lossy().ends_with(ext.as_str()))
            })
            .collect();
        if sources.is_empty() {
            continue;
        }

        tracing::info!(files = sources.len(), "change detected, recompiling");
        let compiler = trb::compiler::Compiler::new(config);
        let files = fs::discover_files(compiler.config(), &sources)?;
        let outcome = driver::compile_files(&compiler, &files);
        report_outcome(&outcome, &mut on_report);
    }
    Ok(())
}

fn report_outcome(outcome: &driver::DriveOutcome, on_report: &mut impl FnMut(&str)) {
    for report in &outcome.reports {
        on_report(report);
    }
    on_report(&reporter::render_summary(
        outcome.compiled,
        outcome.errors,
        outcome.warnings,
    ));
}
