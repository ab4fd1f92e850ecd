use crate::infra::AppState;
use crate::rate_limit::{enforce_rate_limit, RateLimiter};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use scout_ai::workflows::recruiting::{
    recruiting_router, OutreachSender, PitchWriter, RecruitingService, SourcingAgent,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_recruiting_routes<S, P, O>(
    service: Arc<RecruitingService<S, P, O>>,
    limiter: Arc<RateLimiter>,
) -> axum::Router
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    recruiting_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            enforce_rate_limit,
        ))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
