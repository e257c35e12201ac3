//! Artifact files written by `adocs build` and read back by the query
//! commands and servers.
//!
//! | File | Contents |
//! |------|----------|
//! | `llm-sitemap.json` | Manifest of every page |
//! | `agent-docs.json` | Page payloads keyed by route, corpus order |
//! | `search-index.json` | BM25 index, only when search is enabled |
//!
//! Each file is written to a temporary file in `out_dir` and renamed into
//! place, so a reader never sees a partially written artifact. Readers
//! only pair an index with the page payloads it was built from.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use agent_docs_core::models::AgentDoc;
use agent_docs_core::query::QueryServer;
use agent_docs_core::search::SearchIndex;

use crate::compile::BuildArtifacts;

pub const SITEMAP_FILE: &str = "llm-sitemap.json";
pub const AGENT_DOCS_FILE: &str = "agent-docs.json";
pub const SEARCH_INDEX_FILE: &str = "search-index.json";

/// Write all artifacts into `out_dir`, creating it if needed.
///
/// A stale `search-index.json` is removed when the build has no index, so
/// the Search operation is not exposed over an outdated corpus.
pub fn write_artifacts(out_dir: &Path, artifacts: &BuildArtifacts) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    write_json(&out_dir.join(SITEMAP_FILE), &artifacts.sitemap)?;

    let mut docs = Map::new();
    for doc in &artifacts.agent_docs {
        docs.insert(doc.path().to_string(), serde_json::to_value(doc)?);
    }
    write_json(&out_dir.join(AGENT_DOCS_FILE), &Value::Object(docs))?;

    let index_path = out_dir.join(SEARCH_INDEX_FILE);
    match &artifacts.search_index {
        Some(index) => write_json(&index_path, index)?,
        None if index_path.exists() => {
            std::fs::remove_file(&index_path).with_context(|| {
                format!("Failed to remove stale index: {}", index_path.display())
            })?;
            tracing::info!(path = %index_path.display(), "removed stale search index");
        }
        None => {}
    }

    tracing::info!(
        out_dir = %out_dir.display(),
        pages = artifacts.agent_docs.len(),
        "wrote artifacts"
    );
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Load page payloads from `agent-docs.json`, in corpus order.
pub fn load_agent_docs(out_dir: &Path) -> Result<Vec<AgentDoc>> {
    let path = out_dir.join(AGENT_DOCS_FILE);
    let content = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read {} (run `adocs build` first)",
            path.display()
        )
    })?;
    let docs: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    docs.into_iter()
        .map(|(key, value)| {
            serde_json::from_value::<AgentDoc>(value)
                .with_context(|| format!("Invalid page entry '{}' in {}", key, path.display()))
        })
        .collect()
}

/// Load the search index if one was built.
///
/// A missing or unreadable index means search is unavailable, not a failure.
pub fn load_search_index(out_dir: &Path) -> Option<SearchIndex> {
    let path = out_dir.join(SEARCH_INDEX_FILE);
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable search index");
            None
        }
    }
}

/// Build a query snapshot from the artifacts in `out_dir`.
///
/// An index whose documents differ from the loaded pages belongs to another
/// build and is dropped, leaving search unavailable.
pub fn load_query_server(out_dir: &Path) -> Result<QueryServer> {
    let docs = load_agent_docs(out_dir)?;
    let index = load_search_index(out_dir).filter(|index| {
        let matches = index_matches_docs(index, &docs);
        if !matches {
            tracing::warn!(
                out_dir = %out_dir.display(),
                "search index does not match page payloads, search disabled"
            );
        }
        matches
    });
    tracing::debug!(
        pages = docs.len(),
        search = index.is_some(),
        "loaded query snapshot"
    );
    Ok(QueryServer::new(docs, index))
}

fn index_matches_docs(index: &SearchIndex, docs: &[AgentDoc]) -> bool {
    index.documents.len() == docs.len()
        && index
            .documents
            .iter()
            .zip(docs)
            .all(|(indexed, doc)| indexed.path == doc.path())
}

pub fn sitemap_path(out_dir: &Path) -> PathBuf {
    out_dir.join(SITEMAP_FILE)
}
