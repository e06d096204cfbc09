//! Keepalive HTTP surface for hosted environments that ping the process.
//!
//! Serves a static liveness payload and nothing else; the monitor's state is
//! not exposed here. `/` answers as well as `/health` because hosting pings
//! are usually pointed at the root path.
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub fn router() -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "bot": "running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Bind and serve until the process exits. A failed bind is logged and
/// swallowed; the keepalive page must never take the monitor down.
pub async fn serve(port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            warn!(%addr, error = %err, "keepalive.bind_failed");
            return;
        }
    };
    info!(%addr, "keepalive.listening");
    if let Err(err) = axum::serve(listener, router()).await {
        warn!(error = %err, "keepalive.server_stopped");
    }
}
