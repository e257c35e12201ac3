use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use agent_docs_core::routes::DEFAULT_BASE_PATH;
use agent_docs_core::tokens::DEFAULT_CHARS_PER_TOKEN;

pub const ENV_BASE_PATH: &str = "AGENT_DOCS_BASE_PATH";
pub const ENV_SEARCH_INDEX: &str = "AGENT_DOCS_SEARCH_INDEX";
pub const ENV_CHARS_PER_TOKEN: &str = "AGENT_DOCS_CHARS_PER_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            base_path: default_base_path(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("src/docs")
}
fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}
fn default_include_globs() -> Vec<String> {
    [
        "**/*.vllm",
        "**/*.js",
        "**/*.mjs",
        "**/*.md",
        "**/*.mdx",
        "**/*.markdown",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BuildConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
    #[serde(default)]
    pub search_index: bool,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            chars_per_token: default_chars_per_token(),
            search_index: false,
            base_url: None,
        }
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist/llm")
}
fn default_chars_per_token() -> usize {
    DEFAULT_CHARS_PER_TOKEN
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}

/// Load configuration from `path`, then apply `AGENT_DOCS_*` environment
/// overrides. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str::<Config>(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Apply environment overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_path) = lookup(ENV_BASE_PATH) {
        config.docs.base_path = base_path;
    }

    if let Some(raw) = lookup(ENV_SEARCH_INDEX) {
        config.build.search_index = parse_flag(&raw).with_context(|| {
            format!("{ENV_SEARCH_INDEX} must be one of 1/true/yes/on or 0/false/no/off")
        })?;
    }

    if let Some(raw) = lookup(ENV_CHARS_PER_TOKEN) {
        config.build.chars_per_token = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_CHARS_PER_TOKEN} must be a positive integer"))?;
    }

    Ok(())
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid flag value '{}'", other),
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.build.chars_per_token == 0 {
        anyhow::bail!("build.chars_per_token must be > 0");
    }

    if config.docs.base_path.trim().is_empty() {
        anyhow::bail!("docs.base_path must not be empty");
    }

    if config.docs.include_globs.is_empty() {
        anyhow::bail!("docs.include_globs must list at least one pattern");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.docs.base_path, "/docs");
        assert_eq!(config.build.chars_per_token, 4);
        assert!(!config.build.search_index);
        assert_eq!(config.build.out_dir, PathBuf::from("dist/llm"));
    }

    #[test]
    fn test_default_globs_cover_every_dialect() {
        let config = Config::default();
        for ext in ["vllm", "js", "mjs", "md", "mdx", "markdown"] {
            assert!(
                agent_docs_core::parse::SourceDialect::from_extension(ext).is_some(),
                "{ext}"
            );
            let glob = format!("**/*.{ext}");
            assert!(config.docs.include_globs.contains(&glob), "{glob}");
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7331");
    }

    #[test]
    fn test_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("agent-docs.toml");
        std::fs::write(
            &path,
            "[docs]\nroot = \"content\"\n\n[build]\nsearch_index = true\nbase_url = \"https://example.com\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.docs.root, PathBuf::from("content"));
        assert_eq!(config.docs.base_path, "/docs");
        assert_eq!(config.build.base_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_zero_chars_per_token_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("agent-docs.toml");
        std::fs::write(&path, "[build]\nchars_per_token = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("chars_per_token"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_BASE_PATH, "/guides"),
                (ENV_SEARCH_INDEX, "Yes"),
                (ENV_CHARS_PER_TOKEN, "3"),
            ]),
        )
        .unwrap();
        assert_eq!(config.docs.base_path, "/guides");
        assert!(config.build.search_index);
        assert_eq!(config.build.chars_per_token, 3);
    }

    #[test]
    fn test_env_flag_disable() {
        let mut config = Config::default();
        config.build.search_index = true;
        apply_env_overrides(&mut config, env(&[(ENV_SEARCH_INDEX, "off")])).unwrap();
        assert!(!config.build.search_index);
    }

    #[test]
    fn test_malformed_env_is_error() {
        let mut config = Config::default();
        assert!(apply_env_overrides(&mut config, env(&[(ENV_SEARCH_INDEX, "maybe")])).is_err());
        assert!(apply_env_overrides(&mut config, env(&[(ENV_CHARS_PER_TOKEN, "four")])).is_err());
    }
}
