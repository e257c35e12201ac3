//! # Agent Docs CLI (`adocs`)
//!
//! ## Usage
//!
//! ```bash
//! adocs --config ./config/agent-docs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `adocs build` | Compile sources and write artifacts |
//! | `adocs list` | List every page with summary and token cost |
//! | `adocs get <path>` | Print one page |
//! | `adocs search "<query>"` | Rank pages against a query |
//! | `adocs serve mcp` | MCP server over stdio |
//! | `adocs serve http` | HTTP tool API |
//!
//! Logs go to stderr (`RUST_LOG` controls the filter); stdout carries only
//! command output and the MCP stream.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use agent_docs::{compile, config, get, mcp, search, server};

/// Agent Docs CLI: compile documentation into agent-consumable artifacts
/// and serve it to coding agents.
#[derive(Parser)]
#[command(
    name = "adocs",
    about = "Compile documentation into agent-consumable artifacts and serve them over MCP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/agent-docs.toml`. A missing file means
    /// built-in defaults.
    #[arg(long, global = true, default_value = "./config/agent-docs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the docs root and write artifacts to `build.out_dir`.
    ///
    /// Sources that fail to parse are reported and skipped.
    Build {
        /// Fail without writing artifacts if any source fails to parse.
        #[arg(long)]
        strict: bool,
    },

    /// List every page with its summary and token cost.
    List,

    /// Print one page as JSON.
    Get {
        /// Page path, e.g. `/docs/setup`.
        path: String,
    },

    /// Search pages (requires `build.search_index = true`).
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Serve the built artifacts to agents.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// MCP server over stdio.
    Mcp,
    /// HTTP tool API on `[server].bind`.
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build { strict } => {
            compile::run_build(&cfg, strict)?;
        }
        Commands::List => {
            get::run_list(&cfg)?;
        }
        Commands::Get { path } => {
            get::run_get(&cfg, &path)?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit)?;
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                mcp::run_stdio(&cfg).await?;
            }
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
