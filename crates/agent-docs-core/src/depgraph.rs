//! Dependency graph validation.
//!
//! Every `requires` entry should name a compiled page. Dangling references
//! are reported but never fail a build or get stripped from the output.
//! Each `(source, requires)` pair is reported once per seen-set, so the set
//! is owned by the validator and can be shared explicitly between
//! validators that should suppress each other's repeats.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::models::CompiledDocument;
use crate::routes::normalize_lookup;

/// Pairs of `(source path, declared requires entry)` already reported.
pub type SeenSet = Arc<Mutex<HashSet<(String, String)>>>;

/// A declared prerequisite that does not resolve to a compiled page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyWarning {
    pub source: String,
    pub requires: String,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyValidator {
    seen: SeenSet,
}

impl DependencyValidator {
    /// Validator with a fresh, private seen-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator that records into an existing seen-set.
    pub fn with_seen_set(seen: SeenSet) -> Self {
        Self { seen }
    }

    pub fn seen_set(&self) -> SeenSet {
        Arc::clone(&self.seen)
    }

    /// Check every `requires` entry against the corpus.
    ///
    /// Returns only warnings not previously recorded in this validator's
    /// seen-set, in corpus order.
    pub fn validate(&self, documents: &[CompiledDocument]) -> Vec<DependencyWarning> {
        let known: HashSet<&str> = documents.iter().map(|d| d.path.as_str()).collect();

        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            // Entries are idempotent once inserted, so a poisoned set is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut warnings = Vec::new();
        for doc in documents {
            for required in doc.metadata.requires() {
                if known.contains(normalize_lookup(required)) {
                    continue;
                }
                if !seen.insert((doc.path.clone(), required.clone())) {
                    continue;
                }
                tracing::warn!(
                    source = %doc.path,
                    requires = %required,
                    "required page does not exist"
                );
                warnings.push(DependencyWarning {
                    source: doc.path.clone(),
                    requires: required.clone(),
                });
            }
        }
        warnings
    }
}
