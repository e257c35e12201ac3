//! # Agent Docs Core
//!
//! I/O-free documentation pipeline: source parsing, metadata
//! normalization, token cost estimation, dependency validation, sitemap
//! generation, BM25 indexing, and the query server.
//!
//! This crate does no filesystem or network I/O and spawns no tasks.
//! Callers hand it source strings and receive plain values back; the
//! `agent-docs` application crate owns discovery, artifacts, and transports.

pub mod depgraph;
pub mod metadata;
pub mod models;
pub mod parse;
pub mod query;
pub mod routes;
pub mod search;
pub mod sitemap;
pub mod tokens;
