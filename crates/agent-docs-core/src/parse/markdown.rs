//! Markdown with YAML frontmatter.
//!
//! ```text
//! ---
//! priority: high
//! requires: [/docs/setup]
//! ---
//! # Body starts here
//! ```
//!
//! Only the frontmatter block is treated as structured data; the body is
//! carried through verbatim (trimmed) and never interpreted.

use serde_json::Value;

use super::{ParseError, SourceParser};
use crate::metadata::normalize_value;
use crate::models::{Metadata, ParsedSource};

const DELIMITER: &str = "---";

/// Parser strategy for Markdown / MDX sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl SourceParser for MarkdownParser {
    fn parse(&self, source: &str) -> Result<ParsedSource, ParseError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let Some((block, body)) = split_frontmatter(source) else {
            return Ok(ParsedSource {
                content: source.trim().to_string(),
                metadata: Metadata::default(),
            });
        };

        let metadata = if block.trim().is_empty() {
            Metadata::default()
        } else {
            let raw: Value = serde_yaml::from_str(block)
                .map_err(|e| ParseError::frontmatter(e.to_string()))?;
            normalize_value(&raw)
        };

        Ok(ParsedSource {
            content: body.trim().to_string(),
            metadata,
        })
    }
}

/// Split `source` into `(frontmatter, body)`.
///
/// The first line must be exactly `---`; the block ends at the next line
/// that is exactly `---`. Returns `None` when either delimiter is missing.
fn split_frontmatter(source: &str) -> Option<(&str, &str)> {
    let first_line_end = source.find('\n').unwrap_or(source.len());
    if source[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let block_start = (first_line_end + 1).min(source.len());
    let mut offset = block_start;
    for line in source[block_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = &source[block_start..offset];
            let body = &source[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}
