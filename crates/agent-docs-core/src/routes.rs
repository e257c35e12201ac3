//! Canonical route paths for compiled documents.

/// Default route prefix for documentation pages.
pub const DEFAULT_BASE_PATH: &str = "/docs";

/// Build the route for a source file relative to the docs root.
///
/// The extension is dropped and a trailing `index` segment maps to its
/// directory, so `guide/index.md` under `/docs` becomes `/docs/guide` and a
/// top-level `index.vllm` becomes `/docs` itself.
pub fn route_path(base_path: &str, relative_file: &str) -> String {
    let relative = relative_file.replace('\\', "/");
    let without_ext = match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') => &relative[..dot],
        _ => relative.as_str(),
    };
    let name = if without_ext == "index" {
        ""
    } else {
        without_ext.strip_suffix("/index").unwrap_or(without_ext)
    };
    canonicalize(&format!("{}/{}", base_path, name))
}

/// Collapse duplicate separators, force a leading `/`, and drop a trailing
/// `/` unless the whole path is the root.
pub fn canonicalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Strip exactly one trailing `/` from a requested path. The root stays `/`.
pub fn normalize_lookup(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some("") | None => path,
        Some(stripped) => stripped,
    }
}
