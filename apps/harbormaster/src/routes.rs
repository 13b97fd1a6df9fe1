//! Business routes served beside the coordination boundary.
//!
//! The factory contract: return a plain router, never bind a socket, and
//! stay off the boundary paths (`/health`, `/whoami`, `/api/healthz`).

use coord_core::APP_NAME;
use coord_core::server::app::ServerMeta;

use axum::Router;
use axum::response::Json;
use axum::routing::get;
use serde_json::{Value, json};

const STATUS_ROUTE: &str = "/api/status";

/// Route factory handed to the coordinator at startup.
///
/// Launch metadata is baked in at build time: whichever process launched
/// the server, `/api/status` reports THAT launch, not the caller's.
pub fn api_routes(meta: &ServerMeta) -> Router {
    let started_at = meta.started_at.clone();
    let mode = meta.mode;

    Router::new().route(
        STATUS_ROUTE,
        get(move || {
            let started_at = started_at.clone();
            async move { status(started_at, mode.to_string()) }
        }),
    )
}

fn status(started_at: Option<String>, scope: String) -> Json<Value> {
    Json(json!({
        "app": APP_NAME,
        "scope": scope,
        "startedAt": started_at,
    }))
}
