//! # Agent Docs
//!
//! Compiles a documentation tree into artifacts built for autonomous
//! agents, and serves them through three tools: list pages, read a page,
//! and search.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌───────────────────┐
//! │ connector_fs│──▶│     compile      │──▶│      export       │
//! │ .md / .vllm │   │ parse + validate │   │ sitemap, payload, │
//! └─────────────┘   │ sitemap + index  │   │ search index      │
//!                   └──────────────────┘   └─────────┬─────────┘
//!                                                    │
//!                      ┌─────────────────────────────┤
//!                      ▼                             ▼
//!                 ┌──────────┐                 ┌──────────┐
//!                 │   CLI    │                 │ MCP/HTTP │
//!                 │ (adocs)  │                 │  tools   │
//!                 └──────────┘                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! adocs build                         # compile src/docs into dist/llm
//! adocs list                          # every page with summary and cost
//! adocs get /docs/setup               # one page
//! adocs search "authentication"       # requires build.search_index
//! adocs serve mcp                     # MCP over stdio
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`connector_fs`] | Source discovery |
//! | [`compile`] | Build pass |
//! | [`export`] | Artifact writing and loading |
//! | [`traits`] | Tool trait and registry |
//! | [`mcp`] | MCP bridge over stdio |
//! | [`server`] | HTTP tool API |

pub mod compile;
pub mod config;
pub mod connector_fs;
pub mod export;
pub mod get;
pub mod mcp;
pub mod search;
pub mod server;
pub mod traits;
