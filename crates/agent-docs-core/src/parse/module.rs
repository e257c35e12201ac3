//! Module-style doc sources (`.vllm`).
//!
//! A module source is an ECMAScript module carrying two recognised shapes:
//!
//! ```js
//! export const LLM_Meta = { priority: "high", requires: ["/docs/setup"] };
//!
//! export default function () {
//!   return `# Core concepts
//! Text with ${placeholders} collapsed to nothing.`;
//! }
//! ```
//!
//! The source is parsed into a full syntax tree with tree-sitter and the
//! tree is walked for exactly those shapes. Nothing is evaluated: template
//! substitutions become empty segments and metadata values are lifted only
//! from literals.

use serde_json::{Map, Number, Value};
use tree_sitter::{Node, Parser, Tree};

use super::{ParseError, SourceParser};
use crate::metadata::normalize_metadata;
use crate::models::ParsedSource;

/// Name of the named export holding document metadata.
pub const META_EXPORT_NAME: &str = "LLM_Meta";

/// Parser strategy for module sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleParser;

impl SourceParser for ModuleParser {
    fn parse(&self, source: &str) -> Result<ParsedSource, ParseError> {
        let tree = parse_tree(source)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(ParseError::syntax(describe_syntax_error(root, source)));
        }
        if let Some(stmt) = stray_return(root) {
            return Err(ParseError::syntax(format!(
                "`return` outside of a function at {}",
                location(stmt)
            )));
        }

        let mut scan = ExportScan::default();
        visit_exports(root, source, &mut scan)?;
        Ok(scan.result)
    }
}

/// Exports applied so far. A module may export each name only once.
#[derive(Default)]
struct ExportScan {
    result: ParsedSource,
    seen_default: bool,
    seen_meta: bool,
}

fn parse_tree(source: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| ParseError::Grammar(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| ParseError::syntax("parser produced no syntax tree"))
}

/// Walk the tree and apply every export statement in document order.
fn visit_exports(node: Node, src: &str, scan: &mut ExportScan) -> Result<(), ParseError> {
    if node.kind() == "export_statement" {
        return apply_export(node, src, scan);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit_exports(child, src, scan)?;
    }
    Ok(())
}

fn apply_export(export: Node, src: &str, scan: &mut ExportScan) -> Result<(), ParseError> {
    let is_default = has_token(export, "default");
    if is_default {
        if scan.seen_default {
            return Err(duplicate_export("default", export));
        }
        scan.seen_default = true;
    }

    let target = export
        .child_by_field_name("declaration")
        .or_else(|| export.child_by_field_name("value"));
    let Some(target) = target else {
        return Ok(());
    };

    if is_default {
        if let Some(content) = default_export_content(target, src) {
            scan.result.content = content;
        }
    } else if let Some(declarator) = meta_declarator(target, src) {
        if scan.seen_meta {
            return Err(duplicate_export(META_EXPORT_NAME, export));
        }
        scan.seen_meta = true;
        if let Some(meta) = meta_object(declarator, src) {
            scan.result.metadata = normalize_metadata(&meta);
        }
    }
    Ok(())
}

fn duplicate_export(name: &str, export: Node) -> ParseError {
    ParseError::syntax(format!(
        "duplicate export `{name}` at {}",
        location(export)
    ))
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// The `LLM_Meta` declarator of an exported variable declaration.
fn meta_declarator<'t>(decl: Node<'t>, src: &str) -> Option<Node<'t>> {
    if !matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
        return None;
    }
    let mut cursor = decl.walk();
    let found = decl.named_children(&mut cursor).find(|declarator| {
        declarator.kind() == "variable_declarator"
            && declarator
                .child_by_field_name("name")
                .is_some_and(|name| name.kind() == "identifier" && text(name, src) == META_EXPORT_NAME)
    });
    found
}

/// `LLM_Meta = { ... }` → the object literal as a raw bag.
fn meta_object(declarator: Node, src: &str) -> Option<Map<String, Value>> {
    let value = declarator.child_by_field_name("value")?;
    if value.kind() != "object" {
        return None;
    }
    Some(object_to_map(value, src))
}

/// Return value of a default-exported function, if it is a string or template.
fn default_export_content(func: Node, src: &str) -> Option<String> {
    let is_function = matches!(
        func.kind(),
        "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function_declaration"
            | "generator_function"
            | "arrow_function"
    );
    if !is_function {
        return None;
    }
    let body = func.child_by_field_name("body")?;
    if body.kind() != "statement_block" {
        return None;
    }

    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "return_statement" {
            continue;
        }
        let Some(arg) = first_named_non_comment(stmt) else {
            continue;
        };
        match arg.kind() {
            "template_string" => return Some(template_text(arg, src).trim().to_string()),
            "string" => return Some(string_text(arg, src).trim().to_string()),
            _ => continue,
        }
    }
    None
}

fn first_named_non_comment(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    found
}

// ── Literal coercion ────────────────────────────────────────────────

/// Lift a literal expression into a JSON value. `None` means "absent".
fn node_to_value(node: Node, src: &str) -> Option<Value> {
    match node.kind() {
        "string" => Some(Value::String(string_text(node, src))),
        "template_string" if !has_substitution(node) => {
            Some(Value::String(template_text(node, src)))
        }
        "number" => number_value(text(node, src)),
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        "identifier" => Some(Value::String(text(node, src).to_string())),
        "array" => {
            let mut cursor = node.walk();
            let items = node
                .named_children(&mut cursor)
                .filter(|el| !matches!(el.kind(), "comment" | "spread_element"))
                .map(|el| node_to_value(el, src).unwrap_or(Value::Null))
                .collect();
            Some(Value::Array(items))
        }
        "object" => Some(Value::Object(object_to_map(node, src))),
        _ => None,
    }
}

fn object_to_map(node: Node, src: &str) -> Map<String, Value> {
    let mut map = Map::new();
    let mut cursor = node.walk();
    for prop in node.named_children(&mut cursor) {
        match prop.kind() {
            "pair" => {
                let Some(key) = prop.child_by_field_name("key").and_then(|k| property_key(k, src))
                else {
                    continue;
                };
                let value = prop
                    .child_by_field_name("value")
                    .and_then(|v| node_to_value(v, src));
                match value {
                    Some(v) => {
                        map.insert(key, v);
                    }
                    None => {
                        map.remove(&key);
                    }
                }
            }
            "shorthand_property_identifier" => {
                let name = text(prop, src).to_string();
                map.insert(name.clone(), Value::String(name));
            }
            _ => {}
        }
    }
    map
}

fn property_key(key: Node, src: &str) -> Option<String> {
    match key.kind() {
        "property_identifier" | "identifier" => Some(text(key, src).to_string()),
        "string" => Some(string_text(key, src)),
        "number" => Some(text(key, src).to_string()),
        _ => None,
    }
}

fn number_value(raw: &str) -> Option<Value> {
    let cleaned: String = raw.trim_end_matches('n').chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find(|(prefix, _)| lower.starts_with(prefix));
    if let Some((prefix, radix)) = radix {
        return u64::from_str_radix(&lower[prefix.len()..], radix)
            .ok()
            .map(|n| Value::Number(n.into()));
    }
    let f: f64 = cleaned.parse().ok()?;
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        return Some(Value::Number((f as i64).into()));
    }
    Number::from_f64(f).map(Value::Number)
}

// ── String and template text ────────────────────────────────────────

fn text<'a>(node: Node, src: &'a str) -> &'a str {
    &src[node.byte_range()]
}

fn has_substitution(template: Node) -> bool {
    let mut cursor = template.walk();
    let found = template
        .named_children(&mut cursor)
        .any(|c| c.kind() == "template_substitution");
    found
}

/// Cooked value of a quoted string literal.
fn string_text(node: Node, src: &str) -> String {
    let raw = text(node, src);
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { "" };
    cook(inner)
}

/// Cooked literal segments of a template, with `${...}` collapsed to nothing.
fn template_text(node: Node, src: &str) -> String {
    let start = node.start_byte() + 1;
    let end = node.end_byte().saturating_sub(1).max(start);

    let mut out = String::new();
    let mut pos = start;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "template_substitution" {
            continue;
        }
        out.push_str(&cook(&src[pos..child.start_byte()].replace("\r\n", "\n")));
        pos = child.end_byte();
    }
    out.push_str(&cook(&src[pos..end].replace("\r\n", "\n")));
    out
}

/// Interpret ECMAScript escape sequences.
fn cook(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut pending_high: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            break;
        };
        let unit = match esc {
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                code.unwrap_or(0xFFFD)
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD)
            }
            _ => {
                flush_surrogate(&mut out, &mut pending_high);
                match esc {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'v' => out.push('\u{b}'),
                    '0' => out.push('\0'),
                    '\r' => {
                        if chars.peek() == Some(&'\n') {
                            chars.next();
                        }
                    }
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    other => out.push(other),
                }
                continue;
            }
        };
        push_code_unit(&mut out, &mut pending_high, unit);
    }
    flush_surrogate(&mut out, &mut pending_high);
    out
}

fn push_code_unit(out: &mut String, pending_high: &mut Option<u32>, unit: u32) {
    match unit {
        0xD800..=0xDBFF => {
            flush_surrogate(out, pending_high);
            *pending_high = Some(unit);
        }
        0xDC00..=0xDFFF => match pending_high.take() {
            Some(high) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
            }
            None => out.push('\u{FFFD}'),
        },
        _ => {
            flush_surrogate(out, pending_high);
            out.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
        }
    }
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u32>) {
    if pending_high.take().is_some() {
        out.push('\u{FFFD}');
    }
}

// ── Syntax errors ───────────────────────────────────────────────────

fn describe_syntax_error(root: Node, src: &str) -> String {
    let Some(node) = first_error(root) else {
        return "syntax error".to_string();
    };
    let pos = node.start_position();
    if node.is_missing() {
        format!(
            "missing `{}` at line {}, column {}",
            node.kind(),
            pos.row + 1,
            pos.column + 1
        )
    } else {
        let snippet: String = text(node, src).chars().take(24).collect();
        format!(
            "unexpected `{}` at line {}, column {}",
            snippet.trim(),
            pos.row + 1,
            pos.column + 1
        )
    }
}

fn location(node: Node) -> String {
    let pos = node.start_position();
    format!("line {}, column {}", pos.row + 1, pos.column + 1)
}

/// A `return` statement that no enclosing function owns.
fn stray_return(node: Node) -> Option<Node> {
    if node.kind() == "return_statement" {
        return Some(node);
    }
    if matches!(
        node.kind(),
        "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function_declaration"
            | "generator_function"
            | "arrow_function"
            | "method_definition"
    ) {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(stray_return)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metadata, Priority, Stability};

    fn parse(src: &str) -> ParsedSource {
        ModuleParser.parse(src).unwrap()
    }

    #[test]
    fn test_meta_and_template_content() {
        let parsed = parse(
            r#"
export const LLM_Meta = {
  priority: "high",
  category: 'core-concept',
  token_cost: 120,
  requires: ["/docs/setup"],
  stability: "beta",
  lang: "en",
};

export default function () {
  return `
# Core

Body text.
`;
}
"#,
        );
        assert_eq!(parsed.content, "# Core\n\nBody text.");
        assert_eq!(parsed.metadata.priority, Some(Priority::High));
        assert_eq!(parsed.metadata.category.as_deref(), Some("core-concept"));
        assert_eq!(parsed.metadata.token_cost, Some(120));
        assert_eq!(
            parsed.metadata.requires,
            Some(vec!["/docs/setup".to_string()])
        );
        assert_eq!(parsed.metadata.stability, Some(Stability::Beta));
        assert_eq!(parsed.metadata.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_interpolations_collapse_to_empty() {
        let parsed = parse("export default function render() { return `a${x}b${ {y: 1}.y }c`; }");
        assert_eq!(parsed.content, "abc");
    }

    #[test]
    fn test_plain_string_return() {
        let parsed = parse("export default function () { return \"  It\\'s \\\"quoted\\\"\\n \"; }");
        assert_eq!(parsed.content, "It's \"quoted\"");
    }

    #[test]
    fn test_template_escapes_are_cooked() {
        let parsed = parse("export default () => { return `tick \\` and \\u{1F600} and \\x41`; };");
        assert_eq!(parsed.content, "tick ` and \u{1F600} and A");
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let parsed = parse("export default function () { return '\\uD83D\\uDE00'; }");
        assert_eq!(parsed.content, "\u{1F600}");
    }

    #[test]
    fn test_no_exports_is_empty_not_error() {
        let parsed = parse("const x = 1;\nfunction f() { return 'nope'; }");
        assert_eq!(parsed, ParsedSource::default());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = ModuleParser
            .parse("export const LLM_Meta = { priority: 'high' \nexport default")
            .unwrap_err();
        match err {
            ParseError::Syntax { message } => assert!(message.contains("line")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_target_names_in_comments_and_strings_ignored() {
        let parsed = parse(
            r#"
// export const LLM_Meta = { priority: "low" };
/* export default function () { return "fake"; } */
const decoy = "export const LLM_Meta = { priority: 'medium' }";
export const LLM_Meta = {
  // nested braces { } and a comment mentioning LLM_Meta
  category: "real",
  requires: [/* hole */ "/docs/a"],
};
export default function () {
  const s = "return `nope`";
  return `real content with } and { braces`;
}
"#,
        );
        assert_eq!(parsed.metadata.category.as_deref(), Some("real"));
        assert_eq!(parsed.metadata.priority, None);
        assert_eq!(parsed.metadata.requires, Some(vec!["/docs/a".to_string()]));
        assert_eq!(parsed.content, "real content with } and { braces");
    }

    #[test]
    fn test_non_literal_meta_values_are_absent() {
        let parsed = parse(
            r#"
export const LLM_Meta = {
  priority: getPriority(),
  token_cost: -5,
  category: `guide`,
  requires: ["/docs/a", someVar + "x"],
  lang: en,
};
"#,
        );
        assert_eq!(
            parsed.metadata,
            Metadata {
                category: Some("guide".to_string()),
                lang: Some("en".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_other_named_exports_ignored() {
        let parsed = parse("export const Other = { priority: 'high' };\nexport let LLM_Meta = { priority: 'low' };");
        assert_eq!(parsed.metadata.priority, Some(Priority::Low));
    }

    #[test]
    fn test_meta_not_object_ignored() {
        let parsed = parse("export const LLM_Meta = makeMeta();");
        assert!(parsed.metadata.is_empty());
    }

    #[test]
    fn test_non_function_default_export_ignored() {
        let parsed = parse("export default `not a function`;");
        assert_eq!(parsed.content, "");
    }

    #[test]
    fn test_first_string_return_wins() {
        let parsed = parse(
            "export default function () { if (a) { return 'inner'; } return compute(); return 'second'; }",
        );
        assert_eq!(parsed.content, "second");
    }

    #[test]
    fn test_numbers_and_quoted_keys() {
        let parsed = parse("export const LLM_Meta = { 'token_cost': 0x10, \"lang\": 'de' };");
        assert_eq!(parsed.metadata.token_cost, Some(16));
        assert_eq!(parsed.metadata.lang.as_deref(), Some("de"));
    }

    fn syntax_message(src: &str) -> String {
        match ModuleParser.parse(src).unwrap_err() {
            ParseError::Syntax { message } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_second_default_export_rejected() {
        let message = syntax_message(
            "export default function () { return 'a'; }\nexport default function () { return 'b'; }",
        );
        assert!(message.contains("duplicate export `default`"));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn test_second_meta_export_rejected() {
        let message = syntax_message(
            "export const LLM_Meta = makeMeta();\nexport const LLM_Meta = { priority: 'low' };",
        );
        assert!(message.contains("duplicate export `LLM_Meta`"));
    }

    #[test]
    fn test_top_level_return_rejected() {
        let message = syntax_message("return 'x';");
        assert!(message.contains("outside of a function"));
        assert!(message.contains("line 1, column 1"));

        let nested = syntax_message("if (ready) {\n  return `x`;\n}");
        assert!(nested.contains("line 2"));
    }

    #[test]
    fn test_returns_inside_nested_functions_accepted() {
        let parsed = parse(
            "const helper = () => { return 1; };\nclass Page { render() { return 'm'; } }\nexport default function () { return 'ok'; }",
        );
        assert_eq!(parsed.content, "ok");
    }

    #[test]
    fn test_cook_line_continuation() {
        assert_eq!(cook("a\\\nb"), "ab");
        assert_eq!(cook("tab\\tend"), "tab\tend");
        assert_eq!(cook("\\q"), "q");
    }
}
