//! Input-file discovery.
//!
//! Walks the configured include roots (or explicit CLI inputs), keeps
//! files whose suffix matches `source.extensions`, and drops anything
//! matching a `source.exclude` glob. Results are sorted for reproducible
//! compilation order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use trb::config::TrbConfig;
use walkdir::WalkDir;

/// Discover the files one compilation run should process.
pub fn discover_files(config: &TrbConfig, inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let exclude = build_exclude_set(&config.source.exclude)?;
    let mut files = Vec::new();

    let roots: Vec<PathBuf> = if inputs.is_empty() {
        config.source.include.iter().map(PathBuf::from).collect()
    } else {
        inputs.to_vec()
    };

    for root in roots {
        if root.is_file() {
            if !excluded(&exclude, &root) {
                files.push(root);
            }
            continue;
        }
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(%error, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if has_source_extension(&path, &config.source.extensions)
                && !excluded(&exclude, &path)
            {
                files.push(path);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn build_exclude_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn excluded(set: &GlobSet, path: &Path) -> bool {
    set.is_match(path)
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}
