use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error};

use crate::api_errors::AppError;
use crate::app_state::{ArtifactInfo, HealthResponse, PredictResponse, ServiceContext};

/// Default cap on request bodies, in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Build the service router: UI page, prediction, health and info endpoints
pub fn build_router(ctx: Arc<ServiceContext>) -> Router {
    build_router_with_body_limit(ctx, DEFAULT_MAX_BODY_BYTES)
}

pub fn build_router_with_body_limit(ctx: Arc<ServiceContext>, max_body_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health))
        // orchestration probes
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/info", get(info));

    with_layers(routes, max_body_bytes).with_state(ctx)
}

/// Middleware shared by every route: body limit, panic-to-500, request spans
pub fn with_layers<S>(router: Router<S>, max_body_bytes: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[axum::debug_handler]
async fn predict(
    State(ctx): State<Arc<ServiceContext>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    // The model check comes first so an unavailable model is reported even
    // for unreadable bodies.
    if ctx.engine().is_none() {
        return Err(AppError::model_unavailable("Model not loaded properly"));
    }

    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "unreadable prediction body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::payload_too_large(rejection.body_text())
        } else {
            AppError::invalid_input(format!("Invalid JSON body: {}", rejection.body_text()))
        }
    })?;

    ctx.predict(&payload).map(Json)
}

async fn health(State(ctx): State<Arc<ServiceContext>>) -> Json<HealthResponse> {
    Json(ctx.health())
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readyz(State(ctx): State<Arc<ServiceContext>>) -> (StatusCode, Json<Value>) {
    let ready = ctx.health_state().is_healthy();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "ready": ready })))
}

async fn info(State(ctx): State<Arc<ServiceContext>>) -> Json<ArtifactInfo> {
    Json(ctx.info())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "request handler panicked");
    AppError::internal("Unexpected failure while handling the request").into_response()
}
