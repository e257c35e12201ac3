//! Source parsing.
//!
//! Two interchangeable strategies turn a raw source string into a
//! [`ParsedSource`]:
//!
//! | Dialect | Strategy | Metadata from |
//! |---------|----------|---------------|
//! | Markdown (`.md`, `.mdx`, `.markdown`) | [`MarkdownParser`] | YAML frontmatter |
//! | Module (`.vllm`, `.js`, `.mjs`) | [`ModuleParser`] | `export const LLM_Meta = { ... }` |
//!
//! Both strategies funnel their raw metadata through
//! [`crate::metadata::normalize_metadata`], so callers always see the same
//! canonical shape.

mod markdown;
mod module;

use std::path::Path;

use thiserror::Error;

use crate::models::ParsedSource;

pub use markdown::MarkdownParser;
pub use module::{ModuleParser, META_EXPORT_NAME};

/// Errors raised while parsing a single source.
///
/// A parse error is fatal for that one document only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The module source is not syntactically valid.
    #[error("failed to parse module source: {message}")]
    Syntax { message: String },

    /// The frontmatter block is not valid YAML.
    #[error("failed to parse frontmatter: {message}")]
    Frontmatter { message: String },

    /// The source bytes are not valid UTF-8.
    #[error("source is not valid UTF-8: {message}")]
    Encoding { message: String },

    /// The syntax-tree parser could not be initialised.
    #[error("syntax tree parser unavailable: {0}")]
    Grammar(String),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    pub fn frontmatter(message: impl Into<String>) -> Self {
        Self::Frontmatter {
            message: message.into(),
        }
    }
}

/// A parser strategy for one source dialect.
pub trait SourceParser {
    fn parse(&self, source: &str) -> Result<ParsedSource, ParseError>;
}

/// Source dialects understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDialect {
    Markdown,
    Module,
}

impl SourceDialect {
    /// Detect the dialect from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "mdx" | "markdown" => Some(Self::Markdown),
            "vllm" | "js" | "mjs" => Some(Self::Module),
            _ => None,
        }
    }

    /// Detect the dialect from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Module => "module",
        }
    }

    /// Parse `source` with this dialect's strategy.
    pub fn parse(self, source: &str) -> Result<ParsedSource, ParseError> {
        match self {
            Self::Markdown => MarkdownParser.parse(source),
            Self::Module => ModuleParser.parse(source),
        }
    }

    /// Decode `bytes` as UTF-8, then parse with this dialect's strategy.
    pub fn parse_bytes(self, bytes: &[u8]) -> Result<ParsedSource, ParseError> {
        let source = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding {
            message: e.to_string(),
        })?;
        self.parse(source)
    }
}
