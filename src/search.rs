//! `adocs search`: BM25 search from the command line.

use anyhow::{bail, Result};

use agent_docs_core::search::DEFAULT_TOP_K;

use crate::config::Config;
use crate::export;

/// CLI entry point. Prints `{ "results": [...] }`; an empty list is a
/// normal outcome.
pub fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let server = export::load_query_server(&config.build.out_dir)?;

    let Some(results) = server.search_with_limit(query, limit.unwrap_or(DEFAULT_TOP_K)) else {
        bail!(
            "Search index not available in {}. Set [build] search_index = true and run `adocs build`.",
            config.build.out_dir.display()
        );
    };

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
