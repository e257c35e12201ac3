//! Build pass orchestration.
//!
//! Coordinates the full build flow: discovery → parse → validate →
//! sitemap/payload/index → artifacts. A source that fails to parse is
//! reported and skipped; the rest of the corpus still compiles.

use anyhow::{bail, Result};
use std::collections::HashMap;

use agent_docs_core::depgraph::{DependencyValidator, DependencyWarning};
use agent_docs_core::models::{AgentDoc, CompiledDocument};
use agent_docs_core::parse::ParseError;
use agent_docs_core::routes::route_path;
use agent_docs_core::search::{build_search_index, IndexInput, SearchIndex};
use agent_docs_core::sitemap::{generate_sitemap, summarize, Sitemap};

use crate::config::Config;
use crate::connector_fs::{self, SourceFile};
use crate::export;

/// A source that could not be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileFailure {
    pub relative_path: String,
    pub error: ParseError,
}

#[derive(Debug, Default)]
pub struct CompileReport {
    /// Compiled pages in source order.
    pub documents: Vec<CompiledDocument>,
    pub failures: Vec<CompileFailure>,
}

/// Everything a build writes out.
#[derive(Debug)]
pub struct BuildArtifacts {
    pub sitemap: Sitemap,
    pub agent_docs: Vec<AgentDoc>,
    pub search_index: Option<SearchIndex>,
    pub warnings: Vec<DependencyWarning>,
}

/// Parse every source with its dialect's strategy.
///
/// Failures are collected per file. When two sources map to the same route
/// the first one in source order wins.
pub fn compile_sources(files: &[SourceFile], config: &Config) -> CompileReport {
    let mut report = CompileReport::default();
    let mut routes: HashMap<String, &str> = HashMap::new();

    for file in files {
        let parsed = match file.dialect.parse_bytes(&file.body) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::error!(path = %file.relative_path, %error, "failed to compile source");
                report.failures.push(CompileFailure {
                    relative_path: file.relative_path.clone(),
                    error,
                });
                continue;
            }
        };

        let path = route_path(&config.docs.base_path, &file.relative_path);
        if let Some(first) = routes.get(&path) {
            tracing::warn!(
                path = %path,
                source = %file.relative_path,
                kept = %first,
                "duplicate route, skipping source"
            );
            continue;
        }
        routes.insert(path.clone(), &file.relative_path);

        tracing::debug!(path = %path, dialect = file.dialect.as_str(), "compiled source");
        report.documents.push(CompiledDocument::new(path, parsed));
    }

    report
}

/// Derive every artifact from a compiled corpus.
pub fn build_artifacts(
    corpus: &[CompiledDocument],
    config: &Config,
    validator: &DependencyValidator,
) -> BuildArtifacts {
    let chars_per_token = config.build.chars_per_token;
    let warnings = validator.validate(corpus);

    let sitemap = generate_sitemap(corpus, config.build.base_url.as_deref(), chars_per_token);

    let agent_docs = corpus
        .iter()
        .map(|doc| AgentDoc::from_compiled(doc, chars_per_token))
        .collect();

    let search_index = config.build.search_index.then(|| {
        let summaries: Vec<String> = corpus.iter().map(|d| summarize(&d.content)).collect();
        let inputs: Vec<IndexInput<'_>> = corpus
            .iter()
            .zip(&summaries)
            .map(|(doc, summary)| IndexInput {
                path: &doc.path,
                content: &doc.content,
                summary,
            })
            .collect();
        build_search_index(&inputs)
    });

    BuildArtifacts {
        sitemap,
        agent_docs,
        search_index,
        warnings,
    }
}

/// `adocs build`: compile the docs root and write artifacts to `out_dir`.
pub fn run_build(config: &Config, strict: bool) -> Result<()> {
    let files = connector_fs::scan_sources(config)?;
    let report = compile_sources(&files, config);

    if strict && !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.relative_path, failure.error);
        }
        bail!(
            "{} source(s) failed to compile (--strict)",
            report.failures.len()
        );
    }

    let validator = DependencyValidator::new();
    let artifacts = build_artifacts(&report.documents, config, &validator);
    export::write_artifacts(&config.build.out_dir, &artifacts)?;

    println!("build");
    println!("  sources: {}", files.len());
    println!("  pages: {}", report.documents.len());
    println!("  failed: {}", report.failures.len());
    println!("  missing dependencies: {}", artifacts.warnings.len());
    if let Some(index) = &artifacts.search_index {
        println!("  indexed terms: {}", index.terms.len());
    }
    println!("  out: {}", config.build.out_dir.display());
    println!("ok");

    Ok(())
}
