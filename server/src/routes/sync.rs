//! Sync endpoint routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::auth::Producer;
use crate::error::Result;
use crate::handlers::{handle_sync, SyncRequest};
use crate::sync::PassReport;
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_handler))
        .route("/sync/last", axum::routing::get(last_handler))
}

/// POST /sync - Reconcile a pushed quote list into the table.
///
/// Passes run one at a time; a push arriving mid-pass waits for it. A pass
/// that has started runs to completion even if the producer disconnects.
async fn sync_handler(
    State(state): State<AppState>,
    producer: Producer,
    Json(request): Json<SyncRequest>,
) -> Result<Json<PassReport>> {
    tracing::debug!(?producer, records = request.records.len(), "sync push received");

    let report = handle_sync(
        state.client.clone(),
        &state.config,
        &state.passes,
        request,
    )
    .await?;

    Ok(Json(report))
}

/// GET /sync/last - Report of the most recent pass.
async fn last_handler(
    State(state): State<AppState>,
    _producer: Producer,
) -> std::result::Result<Json<PassReport>, StatusCode> {
    state.passes.last().map(Json).ok_or(StatusCode::NOT_FOUND)
}
