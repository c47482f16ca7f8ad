use crate::{
    config::Config,
    errors::{AppError, AppResult},
    files::{self, document, log_chunk::{self, ChunkLimits}, tree},
    security::{self, Extensions, Sandbox},
    types::{FileQuery, FileResponse, LogQuery, LogResponse, TreeResponse, WriteRequest, WriteResponse},
};
use anyhow::Context;
use axum::{
    extract::{rejection::BytesRejection, rejection::QueryRejection, DefaultBodyLimit, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use std::{sync::Arc, time::Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub sandbox: Arc<Sandbox>,
    pub limits: ChunkLimits,
}

impl AppState {
    pub fn new(cfg: Config, sandbox: Sandbox) -> Self {
        let limits = ChunkLimits {
            default: cfg.limits.default_chunk_bytes,
            max: cfg.limits.max_chunk_bytes,
        };
        Self { cfg: Arc::new(cfg), sandbox: Arc::new(sandbox), limits }
    }
}

pub async fn serve(cfg: Config, sandbox: Sandbox) -> anyhow::Result<()> {
    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    let app = build_router(AppState::new(cfg, sandbox));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

pub fn build_router(shared: AppState) -> Router {
    let limit_bytes = shared.cfg.limits.max_request_kb * 1024;
    let router = Router::new()
        .route("/api/tree", get(markdown_tree).options(options_ok))
        .route("/api/logs/tree", get(log_tree).options(options_ok))
        .route(
            "/api/file",
            get(read_file)
                .put(write_file)
                .options(options_ok)
                .layer(DefaultBodyLimit::max(limit_bytes)),
        )
        .route("/api/log", get(read_log).options(options_ok))
        .fallback(fallback);
    security::allow_any_origin(router)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// OPTIONS on any path, preflights included.
async fn options_ok() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"ok": true})))
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        options_ok().await.into_response()
    } else {
        AppError::NotFound.into_response()
    }
}

async fn markdown_tree(State(state): State<AppState>) -> Response {
    tree_response(&state, "/api/tree", Extensions::MARKDOWN).await
}

async fn log_tree(State(state): State<AppState>) -> Response {
    tree_response(&state, "/api/logs/tree", Extensions::LOGS).await
}

async fn tree_response(state: &AppState, route: &'static str, allowed: Extensions) -> Response {
    let audit = Audit::start(route, "");
    let sandbox = state.sandbox.clone();
    let result = files::blocking(move || {
        // any listing failure is a server fault, missing directories included
        let items = tree::build_tree(&sandbox, &allowed).map_err(AppError::Io)?;
        Ok(TreeResponse { root: sandbox.root_name(), items })
    })
    .await;
    audit.respond(result)
}

type Pairs = Vec<(String, String)>;

async fn read_file(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(pairs)) => FileQuery::from_pairs(&pairs),
        Err(_) => {
            return Audit::start("/api/file", "").respond::<FileResponse>(Err(AppError::InvalidQuery))
        }
    };
    let audit = Audit::start("/api/file", &q.path);
    let sandbox = state.sandbox.clone();
    let result = files::blocking(move || {
        let full = sandbox.resolve(&q.path, Some(&Extensions::MARKDOWN))?;
        let content = document::read_document(&full)?;
        Ok(FileResponse { path: q.path, content })
    })
    .await;
    audit.respond(result)
}

async fn write_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let req = match read_write_body(&headers, state.cfg.limits.max_request_kb, body) {
        Ok(req) => req,
        Err(e) => return Audit::start("/api/file", "").respond::<WriteResponse>(Err(e)),
    };
    let audit = Audit::start("/api/file", &req.path);
    let sandbox = state.sandbox.clone();
    let result = files::blocking(move || {
        let full = sandbox.resolve(&req.path, Some(&Extensions::MARKDOWN))?;
        document::write_document(&full, &req.content)?;
        Ok(WriteResponse { ok: true, path: req.path })
    })
    .await;
    audit.respond(result)
}

fn read_write_body(
    headers: &HeaderMap,
    max_kb: usize,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<WriteRequest> {
    security::content_length_ok(headers, max_kb)?;
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::RequestTooLarge
        } else {
            AppError::InvalidJson
        }
    })?;
    parse_write(&body)
}

/// An empty body reads as `{}`, which then fails on the missing path.
fn parse_write(body: &[u8]) -> AppResult<WriteRequest> {
    if body.is_empty() {
        return Ok(WriteRequest::default());
    }
    serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)
}

async fn read_log(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(pairs)) => LogQuery::from_pairs(&pairs),
        Err(_) => {
            return Audit::start("/api/log", "").respond::<LogResponse>(Err(AppError::InvalidQuery))
        }
    };
    let audit = Audit::start("/api/log", &q.path);
    let sandbox = state.sandbox.clone();
    let limits = state.limits;
    let result = files::blocking(move || {
        let (offset, limit) = limits.parse(q.offset.as_deref(), q.limit.as_deref())?;
        let full = sandbox.resolve(&q.path, Some(&Extensions::LOGS))?;
        let chunk = log_chunk::read_chunk(&full, offset, limit)?;
        Ok(LogResponse { path: q.path, chunk })
    })
    .await;
    audit.respond(result)
}

struct Audit {
    request_id: String,
    route: &'static str,
    path: String,
    started: Instant,
}

impl Audit {
    fn start(route: &'static str, path: &str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            route,
            path: path.to_string(),
            started: Instant::now(),
        }
    }

    fn respond<T: Serialize>(self, result: AppResult<T>) -> Response {
        match result {
            Ok(body) => {
                // approximate bytes_out from JSON length
                let bytes_out = serde_json::to_vec(&body).map(|v| v.len()).unwrap_or(0) as u64;
                self.end("allow", "OK", bytes_out);
                (StatusCode::OK, Json(body)).into_response()
            }
            Err(e) => {
                if let AppError::Io(inner) = &e {
                    tracing::error!(request_id = %self.request_id, route = self.route, error = %inner, "filesystem failure");
                }
                self.end("error", e.code(), 0);
                e.into_response()
            }
        }
    }

    fn end(&self, decision: &str, code: &str, bytes_out: u64) {
        tracing::info!(
            request_id = %self.request_id,
            route = self.route,
            path = %self.path,
            decision = decision,
            code = code,
            duration_ms = self.started.elapsed().as_millis() as u64,
            bytes_out = bytes_out,
            "audit"
        );
    }
}
