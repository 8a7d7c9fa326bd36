use crate::db::DatabaseHandle;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Router served once bootstrap has produced a ready handle.
pub fn bnpl_router<H>(db: H) -> Router
where
    H: DatabaseHandle + Clone + 'static,
{
    Router::new()
        .route("/healthz", get(healthz::<H>))
        .with_state(db)
}

async fn healthz<H: DatabaseHandle>(State(db): State<H>) -> impl IntoResponse {
    match timeout(HEALTH_PING_TIMEOUT, db.ping()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Ok(Err(e)) => {
            warn!(error = %e, "health check ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
        Err(_) => {
            warn!(timeout = ?HEALTH_PING_TIMEOUT, "health check ping timed out");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
    }
}
