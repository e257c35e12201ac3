//! Core data models shared by the compilation pipeline and the query server.
//!
//! These types represent the metadata, compiled documents, and agent-facing
//! payloads that flow from source parsing to the served corpus.

use serde::{Deserialize, Serialize};

use crate::tokens::estimate_token_cost;

/// Crawl priority declared by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Stability marker declared by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Beta,
    Deprecated,
}

impl Stability {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "stable" => Some(Self::Stable),
            "beta" => Some(Self::Beta),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Deprecated => "deprecated",
        }
    }
}

/// Canonical document metadata.
///
/// Every field is optional. Values only ever get here through
/// [`crate::metadata::normalize_metadata`], so a present field always
/// satisfies its type and enum constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Manual cost override. Takes precedence over the estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_cost: Option<u64>,
    /// Paths that should be read before this document, in declared order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Declared prerequisites, or an empty slice.
    pub fn requires(&self) -> &[String] {
        self.requires.as_deref().unwrap_or(&[])
    }
}

/// Result of running one source through a parser strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    /// Body text with the metadata block removed, trimmed.
    pub content: String,
    pub metadata: Metadata,
}

/// One compiled documentation page.
///
/// Created once per source file during a build and never mutated; a new
/// build produces a new set of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    pub content: String,
    pub metadata: Metadata,
    /// Canonical route (see [`crate::routes::route_path`]).
    pub path: String,
}

impl CompiledDocument {
    pub fn new(path: impl Into<String>, parsed: ParsedSource) -> Self {
        Self {
            content: parsed.content,
            metadata: parsed.metadata,
            path: path.into(),
        }
    }

    /// Manual `token_cost` when declared, otherwise the length estimate.
    pub fn resolved_token_cost(&self, chars_per_token: usize) -> u64 {
        resolve_token_cost(&self.metadata, &self.content, chars_per_token)
    }
}

/// Apply the override-before-estimate rule used everywhere cost is surfaced.
pub fn resolve_token_cost(metadata: &Metadata, content: &str, chars_per_token: usize) -> u64 {
    metadata
        .token_cost
        .unwrap_or_else(|| estimate_token_cost(content, chars_per_token))
}

/// `meta` object of the served payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDocMeta {
    pub path: String,
    pub token_cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// Compiled document as served to agents and exported to `agent-docs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDoc {
    pub content: String,
    pub meta: AgentDocMeta,
    /// Present only when the document declares at least one prerequisite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_llm_require: Option<Vec<String>>,
}

impl AgentDoc {
    pub fn from_compiled(doc: &CompiledDocument, chars_per_token: usize) -> Self {
        let requires = doc.metadata.requires();
        Self {
            content: doc.content.clone(),
            meta: AgentDocMeta {
                path: doc.path.clone(),
                token_cost: doc.resolved_token_cost(chars_per_token),
                priority: doc.metadata.priority,
                category: doc.metadata.category.clone(),
                stability: doc.metadata.stability,
                lang: doc.metadata.lang.clone(),
            },
            data_llm_require: if requires.is_empty() {
                None
            } else {
                Some(requires.to_vec())
            },
        }
    }

    pub fn path(&self) -> &str {
        &self.meta.path
    }
}
