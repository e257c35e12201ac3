//! `llm-sitemap.json`: a machine-first manifest of every compiled page with
//! its token weight, prerequisites, and a one-line summary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CompiledDocument, Priority, Stability};

/// Manifest format version.
pub const SITEMAP_VERSION: &str = "1.0";
/// Maximum summary length for non-heading first lines.
pub const SUMMARY_MAX_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub path: String,
    pub token_cost: u64,
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sitemap {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub entries: Vec<SitemapEntry>,
    /// ISO 8601 generation time.
    pub generated_at: String,
}

/// Derive a one-line summary from document content.
///
/// Takes the first line of the content. A Markdown heading loses its `#`
/// marker; any other line longer than [`SUMMARY_MAX_LEN`] characters is
/// cut and suffixed with `...`.
pub fn summarize(content: &str) -> String {
    let first_line = content.trim_start().lines().next().unwrap_or("").trim();
    if first_line.starts_with('#') {
        return first_line.trim_start_matches('#').trim().to_string();
    }
    if first_line.chars().count() <= SUMMARY_MAX_LEN {
        return first_line.to_string();
    }
    let mut cut: String = first_line.chars().take(SUMMARY_MAX_LEN - 3).collect();
    cut.push_str("...");
    cut
}

/// Project the corpus into a sitemap stamped with the current time.
pub fn generate_sitemap(
    documents: &[CompiledDocument],
    base_url: Option<&str>,
    chars_per_token: usize,
) -> Sitemap {
    generate_sitemap_at(documents, base_url, chars_per_token, Utc::now())
}

/// Like [`generate_sitemap`] with an explicit timestamp.
pub fn generate_sitemap_at(
    documents: &[CompiledDocument],
    base_url: Option<&str>,
    chars_per_token: usize,
    generated_at: DateTime<Utc>,
) -> Sitemap {
    let entries = documents
        .iter()
        .map(|doc| SitemapEntry {
            path: doc.path.clone(),
            token_cost: doc.resolved_token_cost(chars_per_token),
            requires: doc.metadata.requires().to_vec(),
            priority: doc.metadata.priority,
            category: doc.metadata.category.clone(),
            stability: doc.metadata.stability,
            summary: summarize(&doc.content),
        })
        .collect();

    Sitemap {
        version: SITEMAP_VERSION.to_string(),
        base_url: base_url.filter(|u| !u.is_empty()).map(str::to_string),
        entries,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
