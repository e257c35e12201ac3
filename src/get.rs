//! `adocs list` and `adocs get`: Enumerate and Fetch from the command line.
//!
//! Both read the artifacts in `out_dir` and print the same JSON the tools
//! return, so scripts can consume CLI output and tool output alike.

use anyhow::Result;

use crate::config::Config;
use crate::export;

/// CLI entry point for Enumerate.
pub fn run_list(config: &Config) -> Result<()> {
    let server = export::load_query_server(&config.build.out_dir)?;
    println!("{}", serde_json::to_string_pretty(&server.enumerate())?);
    Ok(())
}

/// CLI entry point for Fetch. Exits with status 1 when the page is unknown,
/// after printing the not-found payload.
pub fn run_get(config: &Config, path: &str) -> Result<()> {
    let server = export::load_query_server(&config.build.out_dir)?;
    let outcome = server.fetch(path);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.is_error() {
        eprintln!("Error: page not found: {}", path);
        std::process::exit(1);
    }

    Ok(())
}
