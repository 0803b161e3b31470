//! Bondsync Server - keeps a Bitable table in line with scraped bond quotes.
//!
//! The scraper pushes its full quote list to `POST /sync`; each push runs one
//! reconciliation pass against the remote table using the bondsync-engine
//! planning logic.

mod auth;
mod config;
mod error;
mod handlers;
mod routes;
mod store;
mod sync;

use crate::config::Config;
use crate::store::FeishuClient;
use crate::sync::PassLedger;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<FeishuClient>,
    pub config: Arc<Config>,
    /// Serializes passes and keeps the latest report
    pub passes: PassLedger,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, store::StoreError> {
        let client = FeishuClient::new(&config.feishu)?;
        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            passes: PassLedger::default(),
        })
    }
}

/// Build the router with all layers.
fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bondsync_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        table_id = %config.feishu.table_id,
        page_size = config.page_size,
        mapping_policy = ?config.mapping_policy,
        "Starting Bondsync Server on {}:{}",
        config.host,
        config.port
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn state(auth_secret: Option<&str>) -> AppState {
        let secret = auth_secret.map(str::to_string);
        let config = Config::from_lookup(move |key| match key {
            "AUTH_SECRET" => secret.clone(),
            // Unroutable, so any accidental store call fails fast
            "FEISHU_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            "FEISHU_APP_ID" | "FEISHU_APP_SECRET" | "FEISHU_APP_TOKEN" | "FEISHU_TABLE_ID" => {
                Some("tbl_test".to_string())
            }
            _ => None,
        })
        .unwrap();
        AppState::new(config).unwrap()
    }

    fn push(body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/sync").header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_table() {
        let response = app(state(None))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tableId"], "tbl_test");
        assert!(body.get("lastPlan").is_none());
    }

    #[tokio::test]
    async fn push_requires_secret_when_configured() {
        let body = r#"{"records": [{"bond_id": "113050"}]}"#;

        let response = app(state(Some("push-token")))
            .oneshot(push(body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(state(Some("push-token")))
            .oneshot(push(body, Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn repeated_bearer_prefix_is_rejected() {
        let body = r#"{"records": [{"bond_id": "113050"}]}"#;

        let response = app(state(Some("push-token")))
            .oneshot(push(body, Some("Bearer push-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(state(Some("push-token")))
            .oneshot(push(body, Some("push-tok")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn last_report_served_while_pass_runs() {
        let state = state(None);
        let _running = state.passes.begin().await;

        let response = app(state.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["status"], "syncing");

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            app(state).oneshot(Request::get("/sync/last").body(Body::empty()).unwrap()),
        )
        .await
        .expect("/sync/last waited on the running pass")
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unmappable_push_is_unprocessable() {
        // Fails in the mapper, before the token exchange.
        let body = r#"{"records": [{"bond_id": "113050", "bond_nm": "南银转债"}]}"#;

        let response = app(state(Some("push-token")))
            .oneshot(push(body, Some("push-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["details"], "113050");
    }

    #[tokio::test]
    async fn empty_push_is_bad_request() {
        let response = app(state(None))
            .oneshot(push(r#"{"records": []}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn no_pass_yet() {
        let response = app(state(None))
            .oneshot(Request::get("/sync/last").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
