// Path: crates/gateway/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]

use anyhow::Result;
use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bridge_services::{ingest_batch, BridgeContext};
use bridge_telemetry::http::metrics_handler;
use bridge_types::config::{BridgeConfig, GatewayLimits};
use bridge_types::events::ApplyPayload;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower::{
    limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError,
    ServiceBuilder,
};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::Instrument;

// --- Error Handling ---
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg, code) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s, "INVALID_REQUEST"),
            AppError::PayloadTooLarge(s) => {
                (StatusCode::PAYLOAD_TOO_LARGE, s, "PAYLOAD_TOO_LARGE")
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": {"code": code, "message": msg} })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({
                "error": { "code": "TIMEOUT", "message": "request timed out" }
            })),
        )
    } else if err.is::<tower::load_shed::error::Overloaded>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": { "code": "OVERLOADED", "message": err.to_string() }
            })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": { "code": "INTERNAL_ERROR", "message": err.to_string() }
            })),
        )
    }
}

#[derive(Clone)]
struct GatewayState {
    ctx: Arc<BridgeContext>,
}

// --- Handlers ---
async fn health_handler() -> &'static str {
    "proposal forum bridge is running"
}

/// Accepts a webhook batch and hands it to the ingestion handler on its own
/// task. The response does not wait for the batch to be processed.
async fn add_proposal_handler(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<ApplyPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(target: "gateway", error = %rejection.body_text(), "rejected webhook body");
        AppError::from(rejection)
    })?;
    let accepted = payload.transaction_count();
    tracing::debug!(target: "gateway", accepted, "webhook batch accepted");

    let ctx = state.ctx.clone();
    tokio::spawn(
        async move {
            ingest_batch(&ctx, payload).await;
        }
        .instrument(tracing::info_span!("ingest_batch", accepted)),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": accepted })),
    ))
}

/// Builds the router with its full middleware stack.
pub fn router(ctx: Arc<BridgeContext>, limits: &GatewayLimits, metrics_enabled: bool) -> Router {
    let state = Arc::new(GatewayState { ctx });
    let body_limit = limits.body_limit_bytes().unwrap_or(usize::MAX);

    let mut app = Router::new()
        .route("/", get(health_handler))
        .route("/api/add-proposal", post(add_proposal_handler));
    if metrics_enabled {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.with_state(state)
        // `HandleErrorLayer` must wrap the fallible layers to make the service infallible.
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(limits.concurrency_limit))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    limits.request_timeout_secs,
                ))),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        // The extractors' own 2 MiB default would otherwise cap the configured limit.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
}

/// Serves the gateway on `config.listen_addr` until `shutdown_rx` changes.
pub async fn run_server(
    config: &BridgeConfig,
    ctx: Arc<BridgeContext>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = router(ctx, &config.gateway, config.telemetry.metrics_enabled);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "gateway", "Forum bridge listening on {}", addr);

    let server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_rx.changed().await.ok();
            tracing::info!(target: "gateway", "shutting down gracefully");
        },
    );

    if let Err(e) = server.await {
        tracing::error!(target: "gateway", error = %e, "server error");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Request};
    use bridge_services::BridgeSettings;
    use bridge_test_utils::{MockChain, MockForum, MockStore};
    use bridge_types::ProposalRecord;
    use tower::ServiceExt;

    const CONTRACT: &str = "SP000.mega-dao-submission";

    fn app(forum: Arc<MockForum>, metrics_enabled: bool) -> Router {
        let store = Arc::new(MockStore::with_records([ProposalRecord::new("dao.prop-1")]));
        let chain = Arc::new(MockChain::at_height(10).with_parameter(CONTRACT, "proposalDuration", 20));
        let ctx = BridgeContext::new(
            store,
            forum,
            chain,
            BridgeSettings {
                forum_channel_id: "forum-1".into(),
                submission_contract: CONTRACT.into(),
                duration_key: "proposalDuration".into(),
                base_url: "https://dao.example/".into(),
                auto_archive_minutes: 1440,
            },
        );
        router(Arc::new(ctx), &GatewayLimits::default(), metrics_enabled)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::post("/api/add-proposal")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app(Arc::new(MockForum::default()), false)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_proposal_accepts_and_ingests_in_background() {
        let forum = Arc::new(MockForum::default());
        let body = r#"{"apply":[{"transactions":[
            {"metadata":{"result":"(ok true)","description":"(dao.prop-1, u100)","sender":"SP123"}},
            {"metadata":{"result":"(err u1)","description":"(dao.prop-1, u100)","sender":"SP123"}}
        ]}]}"#;

        let response = app(forum.clone(), false).oneshot(post_json(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await, serde_json::json!({ "accepted": 2 }));

        for _ in 0..100 {
            if !forum.created_threads().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let threads = forum.created_threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].1.name, "prop-1 proposal");
    }

    #[tokio::test]
    async fn test_add_proposal_rejects_malformed_json() {
        let forum = Arc::new(MockForum::default());
        let response = app(forum.clone(), false)
            .oneshot(post_json("{\"apply\": 7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
        assert_eq!(forum.channel_reads(), 0);
    }

    fn batch_of_size(bytes: usize) -> String {
        let padding = "x".repeat(bytes);
        format!(
            r#"{{"apply":[{{"transactions":[{{"metadata":{{"result":"(err u1)","description":"(dao.prop-1, u100) {padding}","sender":"SP123"}}}}]}}]}}"#
        )
    }

    #[tokio::test]
    async fn test_batch_above_extractor_default_fits_configured_limit() {
        let response = app(Arc::new(MockForum::default()), false)
            .oneshot(post_json(&batch_of_size(3 * 1024 * 1024)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["accepted"], 1);
    }

    #[tokio::test]
    async fn test_batch_above_configured_limit_is_too_large() {
        let store = Arc::new(MockStore::default());
        let ctx = BridgeContext::new(
            store,
            Arc::new(MockForum::default()),
            Arc::new(MockChain::default()),
            BridgeSettings {
                forum_channel_id: "forum-1".into(),
                submission_contract: CONTRACT.into(),
                duration_key: "proposalDuration".into(),
                base_url: "https://dao.example/".into(),
                auto_archive_minutes: 1440,
            },
        );
        let limits = GatewayLimits {
            body_limit_kb: 1,
            ..Default::default()
        };
        let response = router(Arc::new(ctx), &limits, false)
            .oneshot(post_json(&batch_of_size(4 * 1024)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_empty_batch_is_accepted() {
        let response = app(Arc::new(MockForum::default()), false)
            .oneshot(post_json("{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["accepted"], 0);
    }

    #[tokio::test]
    async fn test_metrics_route_follows_config() {
        let enabled = app(Arc::new(MockForum::default()), true)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(enabled.status(), StatusCode::OK);

        let disabled = app(Arc::new(MockForum::default()), false)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(disabled.status(), StatusCode::NOT_FOUND);
    }
}
