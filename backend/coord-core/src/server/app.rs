use crate::identity::Identity;

use models::{CoordinationScope, ServerIdentity};

use std::any::Any;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use log::{error, info};
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;

const HEALTH_ROUTE: &str = "/health";
const WHOAMI_ROUTE: &str = "/whoami";
const WARMUP_ROUTE: &str = "/api/healthz";

/// Launch metadata handed to the route factory and echoed by `/whoami`.
#[derive(Debug, Clone)]
pub struct ServerMeta {
    /// RFC 3339 timestamp of this launch; `None` for adopted servers.
    pub started_at: Option<String>,
    pub mode: CoordinationScope,
}

/// Builds the business routes mounted beside the coordination boundary.
///
/// Implementations return a plain router and nothing else: the
/// coordination layer owns bind/listen, so factories must never open a
/// socket, claim the boundary paths (`/health`, `/whoami`, `/api/healthz`),
/// or install their own fallback.
pub trait RouteFactory: Send + Sync {
    fn build(&self, meta: &ServerMeta) -> Router;
}

impl<F> RouteFactory for F
where
    F: Fn(&ServerMeta) -> Router + Send + Sync,
{
    fn build(&self, meta: &ServerMeta) -> Router {
        self(meta)
    }
}

#[derive(Debug, Clone)]
struct BoundaryState {
    identity: ServerIdentity,
}

/// Assemble the full HTTP application for one launch.
///
/// Whatever the factory mounts, the boundary contract holds: liveness and
/// identity endpoints always answer, unmatched paths come back as a JSON
/// 404, and a panicking handler turns into a JSON 500 without taking the
/// process down.
pub fn build_app(
    identity: &Identity,
    meta: &ServerMeta,
    factory: &dyn RouteFactory,
    dump_routes: bool,
) -> Router {
    let state = Arc::new(BoundaryState {
        identity: ServerIdentity {
            pid: std::process::id(),
            app_signature: identity.signature().to_string(),
            api_version: identity.api_version().to_string(),
            started_at: meta.started_at.clone(),
            mode: meta.mode,
        },
    });

    if dump_routes {
        info!(
            "Mounted boundary routes: GET {HEALTH_ROUTE}, GET {WHOAMI_ROUTE}, GET {WARMUP_ROUTE} (+ factory routes, JSON 404 fallback, panic fence)"
        );
    }

    let boundary = Router::new()
        .route(HEALTH_ROUTE, get(health))
        .route(WHOAMI_ROUTE, get(who_am_i))
        .route(WARMUP_ROUTE, get(warmup))
        .with_state(state);

    boundary
        .merge(factory.build(meta))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(internal_error))
}

async fn health(State(state): State<Arc<BoundaryState>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "pid": state.identity.pid,
        "ts": epoch_millis(),
    }))
}

async fn who_am_i(State(state): State<Arc<BoundaryState>>) -> Json<ServerIdentity> {
    Json(state.identity.clone())
}

async fn warmup() -> Json<Value> {
    Json(json!({ "ok": true, "ts": epoch_millis() }))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NotFound", "path": uri.path() })),
    )
}

fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unhandled error in route handler")
    };

    error!("Route handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "InternalError", "detail": detail })),
    )
        .into_response()
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
