//! Build-time lexical search index and BM25 ranking.
//!
//! The index is built once per compilation from the whole corpus and then
//! served read-only. It carries no embeddings and is fully serializable, so
//! the query side does no work beyond scoring.
//!
//! # Scoring
//!
//! For every query term `t` found in the index and every posting
//! `(doc, tf)`:
//!
//! ```text
//! norm  = 1 - b + b * (len(doc) / avgdl)
//! score += idf(t) * (tf * (k1 + 1)) / (tf + k1 * norm)
//! idf(t) = ln((N - n_t + 0.5) / (n_t + 0.5) + 1)
//! ```
//!
//! with `k1 = 1.2` and `b = 0.75`. Documents whose total is `<= 0` are
//! discarded, the rest are sorted by score (ties keep corpus order),
//! truncated to `top_k`, and rounded to three decimals.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// BM25 term-frequency saturation.
pub const BM25_K1: f64 = 1.2;
/// BM25 length normalization.
pub const BM25_B: f64 = 0.75;
/// Result count used by the query server.
pub const DEFAULT_TOP_K: usize = 3;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
];

/// One document to index.
#[derive(Debug, Clone)]
pub struct IndexInput<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub summary: &'a str,
}

/// Per-document entry; position in [`SearchIndex::documents`] is the document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub path: String,
    pub summary: String,
    /// Token count after stopword removal.
    pub length: usize,
}

/// A `(document id, term frequency)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "docId")]
    pub doc_id: usize,
    pub tf: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub idf: f64,
    /// One entry per document containing the term, ascending by id.
    pub postings: Vec<Posting>,
}

/// Serializable inverted index (written at build, read at serve time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub documents: Vec<IndexedDocument>,
    pub terms: BTreeMap<String, TermEntry>,
    /// Mean document length in terms; `0` for an empty corpus.
    #[serde(rename = "avgdl")]
    pub avg_doc_length: f64,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub summary: String,
    /// BM25 score rounded to three decimals.
    pub relevance_score: f64,
}

/// Lowercase and split on anything that is not an ASCII letter or digit.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`tokenize`] followed by stopword removal. Used for both indexing and queries.
pub fn index_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Build a BM25 index. Document ids follow input order.
pub fn build_search_index(entries: &[IndexInput<'_>]) -> SearchIndex {
    let mut documents = Vec::with_capacity(entries.len());
    let mut term_postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();

    for (doc_id, entry) in entries.iter().enumerate() {
        let terms = index_terms(&format!("{}\n{}", entry.content, entry.summary));
        documents.push(IndexedDocument {
            path: entry.path.to_string(),
            summary: entry.summary.to_string(),
            length: terms.len(),
        });

        let mut tf_local: HashMap<String, u32> = HashMap::new();
        for term in terms {
            *tf_local.entry(term).or_insert(0) += 1;
        }
        for (term, tf) in tf_local {
            term_postings
                .entry(term)
                .or_default()
                .push(Posting { doc_id, tf });
        }
    }

    let n = documents.len() as f64;
    let avg_doc_length = if documents.is_empty() {
        0.0
    } else {
        documents.iter().map(|d| d.length as f64).sum::<f64>() / n
    };

    let terms = term_postings
        .into_iter()
        .map(|(term, postings)| {
            let n_t = postings.len() as f64;
            let idf = ((n - n_t + 0.5) / (n_t + 0.5) + 1.0).ln();
            (term, TermEntry { idf, postings })
        })
        .collect();

    SearchIndex {
        documents,
        terms,
        avg_doc_length,
    }
}

impl SearchIndex {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Rank documents against `query` and return at most `top_k` hits.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        if self.documents.is_empty() {
            return Vec::new();
        }
        let query_terms = index_terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scores = vec![0.0_f64; self.documents.len()];
        for term in &query_terms {
            let Some(entry) = self.terms.get(term) else {
                continue;
            };
            for posting in &entry.postings {
                let Some(doc) = self.documents.get(posting.doc_id) else {
                    continue;
                };
                let norm = if self.avg_doc_length > 0.0 {
                    1.0 - BM25_B + BM25_B * (doc.length as f64 / self.avg_doc_length)
                } else {
                    1.0
                };
                let tf = posting.tf as f64;
                scores[posting.doc_id] += entry.idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * norm);
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let doc = &self.documents[doc_id];
                SearchHit {
                    path: doc.path.clone(),
                    summary: doc.summary.clone(),
                    relevance_score: round3(score),
                }
            })
            .collect()
    }
}

fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
