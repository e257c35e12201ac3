//! Source discovery on the local filesystem.
//!
//! Walks `docs.root`, keeps files matched by the include globs and not by
//! the exclude globs, and reads each one into a [`SourceFile`] tagged with
//! the parser dialect chosen from its extension. Bodies stay raw bytes;
//! decoding happens per file at compile time so one undecodable source
//! cannot fail the scan.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use agent_docs_core::parse::SourceDialect;

use crate::config::Config;

/// One documentation source read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to `docs.root`, always `/`-separated.
    pub relative_path: String,
    pub dialect: SourceDialect,
    /// Raw file contents, decoded as UTF-8 by the parser.
    pub body: Vec<u8>,
}

pub fn scan_sources(config: &Config) -> Result<Vec<SourceFile>> {
    let root = &config.docs.root;
    if !root.exists() {
        bail!("Docs root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.docs.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.docs.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        if !include_set.is_match(&rel_str) {
            continue;
        }

        let Some(dialect) = SourceDialect::from_path(path) else {
            tracing::debug!(path = %rel_str, "skipping file with unsupported extension");
            continue;
        };

        files.push(read_source(path, rel_str, dialect)?);
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

fn read_source(path: &Path, relative_path: String, dialect: SourceDialect) -> Result<SourceFile> {
    let body = std::fs::read(path)
        .with_context(|| format!("Failed to read source file: {}", path.display()))?;
    Ok(SourceFile {
        relative_path,
        dialect,
        body,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {pattern}"))?);
    }
    Ok(builder.build()?)
}
