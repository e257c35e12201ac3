//! HTTP tool API.
//!
//! Serves the same tools as the MCP bridge as plain JSON over HTTP, plus
//! the sitemap artifact and a reload hook for publishing a fresh build.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version and page count) |
//! | `GET`  | `/tools/list` | List tools available for the current snapshot |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/llm-sitemap.json` | The sitemap artifact from `out_dir` |
//! | `POST` | `/reload` | Re-read artifacts and swap the snapshot |
//!
//! # Error Contract
//!
//! Transport errors use one body shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing required string parameter 'path'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! A page that does not exist is not a transport error: the tool returns
//! `200` with `"is_error": true` and the list of valid paths.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use agent_docs_core::query::SnapshotCell;

use crate::config::Config;
use crate::export;
use crate::traits::{ToolContext, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    out_dir: Arc<PathBuf>,
    snapshots: Arc<SnapshotCell>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let snapshot = export::load_query_server(&config.build.out_dir)?;
    let state = AppState {
        out_dir: Arc::new(config.build.out_dir.clone()),
        snapshots: Arc::new(SnapshotCell::new(snapshot)),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind = %bind_addr, "HTTP tool server listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/llm-sitemap.json", get(handle_sitemap))
        .route("/reload", post(handle_reload))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    pages: usize,
    search: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.snapshots.load();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pages: snapshot.len(),
        search: snapshot.search_enabled(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let snapshot = state.snapshots.load();
    let tools = ToolRegistry::for_snapshot(&snapshot)
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Returns `404` for an unknown tool and `400` for malformed parameters.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let snapshot = state.snapshots.load();
    let registry = ToolRegistry::for_snapshot(&snapshot);
    let tool = registry
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    if !params.is_object() {
        return Err(bad_request("tool parameters must be a JSON object"));
    }

    let ctx = ToolContext::new(Arc::clone(&snapshot));
    let output = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| bad_request(format!("{}: {}", name, e)))?;

    Ok(Json(serde_json::json!({
        "result": output.value,
        "is_error": output.is_error,
    })))
}

// ============ GET /llm-sitemap.json ============

async fn handle_sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
    let path = export::sitemap_path(&state.out_dir);
    let body = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| not_found(format!("sitemap not found at {}", path.display())))?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/json")], body).into_response())
}

// ============ POST /reload ============

#[derive(Serialize)]
struct ReloadResponse {
    pages: usize,
    search: bool,
}

async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let out_dir = Arc::clone(&state.out_dir);
    let snapshot = tokio::task::spawn_blocking(move || export::load_query_server(&out_dir))
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(|e| internal(format!("{:#}", e)))?;

    let response = ReloadResponse {
        pages: snapshot.len(),
        search: snapshot.search_enabled(),
    };
    state.snapshots.publish(snapshot);
    tracing::info!(pages = response.pages, search = response.search, "published new snapshot");

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{build_artifacts, compile_sources};
    use crate::connector_fs::SourceFile;
    use agent_docs_core::depgraph::DependencyValidator;
    use agent_docs_core::parse::SourceDialect;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_build(out_dir: &std::path::Path, search_index: bool) {
        let files = vec![
            SourceFile {
                relative_path: "a.md".to_string(),
                dialect: SourceDialect::Markdown,
                body: "# Intro\nSetup steps.".as_bytes().to_vec(),
            },
            SourceFile {
                relative_path: "b.md".to_string(),
                dialect: SourceDialect::Markdown,
                body: "# API\nAuthentication guide.".as_bytes().to_vec(),
            },
        ];
        let mut config = Config::default();
        config.build.search_index = search_index;
        let report = compile_sources(&files, &config);
        let artifacts = build_artifacts(&report.documents, &config, &DependencyValidator::new());
        export::write_artifacts(out_dir, &artifacts).unwrap();
    }

    fn state(out_dir: &std::path::Path) -> AppState {
        AppState {
            out_dir: Arc::new(out_dir.to_path_buf()),
            snapshots: Arc::new(SnapshotCell::new(
                export::load_query_server(out_dir).unwrap(),
            )),
        }
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_ok_response() {
        let tmp = TempDir::new().unwrap();
        write_build(tmp.path(), false);

        let Json(body) = handle_tool_call(
            State(state(tmp.path())),
            Path("read_documentation_page".to_string()),
            Json(json!({ "path": "/docs/zzz" })),
        )
        .await
        .unwrap();
        assert_eq!(body["is_error"], true);
        assert_eq!(body["result"]["available_paths"], json!(["/docs/a", "/docs/b"]));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_404() {
        let tmp = TempDir::new().unwrap();
        write_build(tmp.path(), false);

        let err = handle_tool_call(
            State(state(tmp.path())),
            Path("search_documentation".to_string()),
            Json(json!({ "query": "x" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_params_is_400() {
        let tmp = TempDir::new().unwrap();
        write_build(tmp.path(), false);

        let err = handle_tool_call(
            State(state(tmp.path())),
            Path("read_documentation_page".to_string()),
            Json(json!({})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reload_publishes_new_snapshot() {
        let tmp = TempDir::new().unwrap();
        write_build(tmp.path(), false);
        let state = state(tmp.path());
        assert!(!state.snapshots.load().search_enabled());

        write_build(tmp.path(), true);
        let Json(resp) = handle_reload(State(state.clone())).await.unwrap();
        assert!(resp.search);
        assert_eq!(resp.pages, 2);

        let Json(list) = handle_list_tools(State(state)).await;
        assert_eq!(list.tools.len(), 3);
    }
}
