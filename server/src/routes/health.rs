//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use bondsync_engine::PlanSummary;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `syncing` while a pass runs
    pub status: &'static str,
    pub version: &'static str,
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_plan: Option<PlanSummary>,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.passes.is_running() {
        "syncing"
    } else {
        "ok"
    };
    let last_plan = state.passes.last().map(|report| report.plan);

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        table_id: state.config.feishu.table_id.clone(),
        last_plan,
    })
}

async fn root() -> &'static str {
    "Bondsync Server"
}
