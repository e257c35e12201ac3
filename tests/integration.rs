use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn adocs_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_adocs"))
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn setup_test_env(search_index: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let docs = root.join("docs");
    write(
        &docs,
        "index.md",
        "---\npriority: high\ncategory: overview\n---\n# Welcome\n\nStart here.\n",
    );
    write(&docs, "api.md", "# API\nAuthentication guide.");
    write(
        &docs,
        "setup.vllm",
        r#"
export const LLM_Meta = {
  priority: "medium",
  requires: ["/docs/api/"],
  stability: "stable",
};

export default function Setup() {
  const version = "1.0";
  return `
# Setup

Install version ${version} and configure tokens.
`;
}
"#,
    );
    write(
        &docs,
        "guide/orphan.md",
        "---\nrequires:\n  - /docs/nowhere\n---\n# Orphan\nPoints at a missing page.",
    );

    let config_content = format!(
        r#"[docs]
root = "{root}/docs"
base_path = "/docs"

[build]
out_dir = "{root}/out"
chars_per_token = 4
search_index = {search_index}
base_url = "https://docs.example.com"
"#,
        root = root.display(),
        search_index = search_index,
    );

    let config_path = root.join("agent-docs.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_adocs(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = adocs_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("AGENT_DOCS_BASE_PATH")
        .env_remove("AGENT_DOCS_SEARCH_INDEX")
        .env_remove("AGENT_DOCS_CHARS_PER_TOKEN")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run adocs binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

#[test]
fn test_build_writes_artifacts() {
    let (tmp, config_path) = setup_test_env(false);

    let (stdout, stderr, success) = run_adocs(&config_path, &["build"]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("pages: 4"));
    assert!(stdout.contains("missing dependencies: 1"));
    assert!(stdout.contains("ok"));

    let out = tmp.path().join("out");
    assert!(out.join("llm-sitemap.json").exists());
    assert!(out.join("agent-docs.json").exists());
    assert!(!out.join("search-index.json").exists());
}

#[test]
fn test_sitemap_contents() {
    let (tmp, config_path) = setup_test_env(false);
    run_adocs(&config_path, &["build"]);

    let sitemap = json(&fs::read_to_string(tmp.path().join("out/llm-sitemap.json")).unwrap());
    assert_eq!(sitemap["version"], "1.0");
    assert_eq!(sitemap["base_url"], "https://docs.example.com");

    let paths: Vec<&str> = sitemap["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        paths,
        vec!["/docs/api", "/docs/guide/orphan", "/docs", "/docs/setup"]
    );

    let setup = &sitemap["entries"][3];
    assert_eq!(setup["summary"], "Setup");
    assert_eq!(setup["priority"], "medium");
    assert_eq!(setup["requires"], serde_json::json!(["/docs/api/"]));
}

#[test]
fn test_missing_dependency_logged_not_fatal() {
    let (_tmp, config_path) = setup_test_env(false);
    let (_, stderr, success) = run_adocs(&config_path, &["build"]);
    assert!(success);
    assert!(stderr.contains("/docs/nowhere"), "stderr={}", stderr);
}

#[test]
fn test_list_pages() {
    let (_tmp, config_path) = setup_test_env(false);
    run_adocs(&config_path, &["build"]);

    let (stdout, stderr, success) = run_adocs(&config_path, &["list"]);
    assert!(success, "list failed: {}", stderr);
    let pages = json(&stdout);
    let pages = pages["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 4);
    assert_eq!(pages[0]["path"], "/docs/api");
    assert_eq!(pages[0]["summary"], "API");
    // "# API\nAuthentication guide." is 27 chars
    assert_eq!(pages[0]["token_cost"], 7);
}

#[test]
fn test_get_page() {
    let (_tmp, config_path) = setup_test_env(false);
    run_adocs(&config_path, &["build"]);

    let (stdout, stderr, success) = run_adocs(&config_path, &["get", "/docs/setup/"]);
    assert!(success, "get failed: {}", stderr);
    let page = json(&stdout);
    assert!(page["content"]
        .as_str()
        .unwrap()
        .starts_with("# Setup\n\nInstall version  and configure tokens."));
    assert_eq!(page["meta"]["path"], "/docs/setup");
    assert_eq!(page["meta"]["stability"], "stable");
    assert_eq!(page["data_llm_require"], serde_json::json!(["/docs/api/"]));
}

#[test]
fn test_get_missing_page() {
    let (_tmp, config_path) = setup_test_env(false);
    run_adocs(&config_path, &["build"]);

    let (stdout, _, success) = run_adocs(&config_path, &["get", "/docs/nope"]);
    assert!(!success);
    let body = json(&stdout);
    assert_eq!(body["error"], "Page not found");
    assert_eq!(body["path"], "/docs/nope");
    assert_eq!(body["available_paths"].as_array().unwrap().len(), 4);
}

#[test]
fn test_search_requires_index() {
    let (_tmp, config_path) = setup_test_env(false);
    run_adocs(&config_path, &["build"]);

    let (_, stderr, success) = run_adocs(&config_path, &["search", "authentication"]);
    assert!(!success);
    assert!(stderr.contains("Search index not available"));
}

#[test]
fn test_search_with_index() {
    let (tmp, config_path) = setup_test_env(true);
    let (stdout, _, success) = run_adocs(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("indexed terms"));
    assert!(tmp.path().join("out/search-index.json").exists());

    let (stdout, stderr, success) = run_adocs(&config_path, &["search", "authentication"]);
    assert!(success, "search failed: {}", stderr);
    let results = json(&stdout);
    let results = results["results"].as_array().unwrap();
    assert_eq!(results[0]["path"], "/docs/api");
    assert!(results[0]["relevance_score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_search_punctuation_only_is_empty() {
    let (_tmp, config_path) = setup_test_env(true);
    run_adocs(&config_path, &["build"]);

    let (stdout, _, success) = run_adocs(&config_path, &["search", "?!"]);
    assert!(success);
    assert_eq!(json(&stdout), serde_json::json!({ "results": [] }));
}

#[test]
fn test_rebuild_without_index_removes_stale_file() {
    let (tmp, config_path) = setup_test_env(true);
    run_adocs(&config_path, &["build"]);
    assert!(tmp.path().join("out/search-index.json").exists());

    let config = fs::read_to_string(&config_path)
        .unwrap()
        .replace("search_index = true", "search_index = false");
    fs::write(&config_path, config).unwrap();

    let (_, _, success) = run_adocs(&config_path, &["build"]);
    assert!(success);
    assert!(!tmp.path().join("out/search-index.json").exists());
}

#[test]
fn test_broken_source_skipped() {
    let (tmp, config_path) = setup_test_env(false);
    write(
        &tmp.path().join("docs"),
        "broken.vllm",
        "export default function () { return `unterminated",
    );

    let (stdout, stderr, success) = run_adocs(&config_path, &["build"]);
    assert!(success, "build failed: {}", stderr);
    assert!(stdout.contains("pages: 4"));
    assert!(stdout.contains("failed: 1"));
    assert!(stderr.contains("broken.vllm"));
}

#[test]
fn test_undecodable_source_skipped() {
    let (tmp, config_path) = setup_test_env(false);
    std::fs::write(tmp.path().join("docs/latin1.md"), [0xff, 0xfe, b'#']).unwrap();

    let (stdout, stderr, success) = run_adocs(&config_path, &["build"]);
    assert!(success, "build failed: {}", stderr);
    assert!(stdout.contains("pages: 4"));
    assert!(stdout.contains("failed: 1"));
    assert!(stderr.contains("latin1.md"));
}

#[test]
fn test_broken_source_strict_fails() {
    let (tmp, config_path) = setup_test_env(false);
    write(
        &tmp.path().join("docs"),
        "broken.vllm",
        "export default function () { return `unterminated",
    );

    let (_, stderr, success) = run_adocs(&config_path, &["build", "--strict"]);
    assert!(!success);
    assert!(stderr.contains("broken.vllm"));
    assert!(!tmp.path().join("out/agent-docs.json").exists());
}

#[test]
fn test_list_before_build_errors() {
    let (_tmp, config_path) = setup_test_env(false);
    let (_, stderr, success) = run_adocs(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("adocs build"));
}

#[test]
fn test_env_override_base_path() {
    let (_tmp, config_path) = setup_test_env(false);
    let output = Command::new(adocs_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("build")
        .env("AGENT_DOCS_BASE_PATH", "/guides")
        .output()
        .unwrap();
    assert!(output.status.success());

    let (stdout, _, success) = run_adocs(&config_path, &["get", "/guides/api"]);
    assert!(success);
    assert_eq!(json(&stdout)["meta"]["path"], "/guides/api");
}
