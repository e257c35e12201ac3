//! Query server: Enumerate, Fetch, and Search over one immutable corpus
//! snapshot.
//!
//! A [`QueryServer`] is built once from a compiled corpus (and optionally a
//! search index) and never mutated. Rebuilds are published by swapping the
//! whole snapshot through a [`SnapshotCell`]; readers holding the previous
//! `Arc` keep a consistent view until they drop it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::models::{AgentDoc, AgentDocMeta};
use crate::routes::normalize_lookup;
use crate::search::{SearchHit, SearchIndex, DEFAULT_TOP_K};
use crate::sitemap::summarize;

/// Error text carried by a not-found Fetch response.
pub const PAGE_NOT_FOUND: &str = "Page not found";

/// One row of the Enumerate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub path: String,
    pub summary: String,
    pub token_cost: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageList {
    pub pages: Vec<PageSummary>,
}

/// Result of a Fetch.
///
/// `NotFound` is a normal outcome, not an error: it lists every valid path
/// so the caller can correct itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FetchOutcome {
    Found {
        content: String,
        meta: AgentDocMeta,
        #[serde(skip_serializing_if = "Option::is_none")]
        data_llm_require: Option<Vec<String>>,
    },
    NotFound {
        error: String,
        path: String,
        available_paths: Vec<String>,
    },
}

impl FetchOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}

/// Read-only view over one build's corpus and optional index.
#[derive(Debug, Default)]
pub struct QueryServer {
    docs: Vec<AgentDoc>,
    by_path: HashMap<String, usize>,
    index: Option<SearchIndex>,
}

impl QueryServer {
    pub fn new(docs: Vec<AgentDoc>, index: Option<SearchIndex>) -> Self {
        let by_path = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (doc.path().to_string(), i))
            .collect();
        Self {
            docs,
            by_path,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.docs.iter().map(|d| d.path().to_string()).collect()
    }

    /// Whether the Search operation is exposed.
    pub fn search_enabled(&self) -> bool {
        self.index.is_some()
    }

    /// List every page with its summary and resolved token cost.
    pub fn enumerate(&self) -> PageList {
        let pages = self
            .docs
            .iter()
            .map(|doc| PageSummary {
                path: doc.path().to_string(),
                summary: summarize(&doc.content),
                token_cost: doc.meta.token_cost,
            })
            .collect();
        PageList { pages }
    }

    /// Look up one page. A single trailing `/` is ignored.
    pub fn fetch(&self, path: &str) -> FetchOutcome {
        let path = normalize_lookup(path);
        match self.by_path.get(path) {
            Some(&i) => {
                let doc = &self.docs[i];
                FetchOutcome::Found {
                    content: doc.content.clone(),
                    meta: doc.meta.clone(),
                    data_llm_require: doc.data_llm_require.clone(),
                }
            }
            None => FetchOutcome::NotFound {
                error: PAGE_NOT_FOUND.to_string(),
                path: path.to_string(),
                available_paths: self.paths(),
            },
        }
    }

    /// Rank pages against `query`. Returns `None` when no index was supplied.
    pub fn search(&self, query: &str) -> Option<SearchResults> {
        self.search_with_limit(query, DEFAULT_TOP_K)
    }

    pub fn search_with_limit(&self, query: &str, top_k: usize) -> Option<SearchResults> {
        let index = self.index.as_ref()?;
        Some(SearchResults {
            results: index.search(query, top_k),
        })
    }
}

/// Holder for the current [`QueryServer`] snapshot.
///
/// The lock is held only long enough to clone or replace the `Arc`; queries
/// run against the cloned snapshot without any lock.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<QueryServer>>,
}

impl SnapshotCell {
    pub fn new(server: QueryServer) -> Self {
        Self {
            current: RwLock::new(Arc::new(server)),
        }
    }

    /// The snapshot in effect right now.
    pub fn load(&self) -> Arc<QueryServer> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the snapshot. In-flight readers keep the previous one.
    pub fn publish(&self, server: QueryServer) -> Arc<QueryServer> {
        let next = Arc::new(server);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, Arc::clone(&next))
    }
}
