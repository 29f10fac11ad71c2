//src/paths/normalize.rs
use axum::{Json, Router, routing::get, extract::{Extension, Query}};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use crate::load_resources::AppState;
use crate::paths::format::AmountParams;
use crate::paths::validate_params::validate_amount_params;
use crate::services::format_service::process_normalize;
use crate::utils::serializer::{failure_response, success_response};

async fn handle_normalize_request(state: Arc<AppState>, params: AmountParams) -> Json<Value> {
    let validation = validate_amount_params(&params, &state);
    if !validation.valid {
        error!("Validation failed: {}", validation.message);
        return Json(failure_response(validation.message));
    }

    let normalized = match process_normalize(&params, &state).await {
        Ok(normalized) => normalized,
        Err(message) => {
            error!("Normalize request failed: {}", message);
            return Json(failure_response(message));
        }
    };

    match serde_json::to_value(normalized) {
        Ok(data) => Json(success_response(data)),
        Err(e) => Json(failure_response(format!("Server error: {}", e))),
    }
}

pub async fn get_normalize_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AmountParams>,
) -> Json<Value> {
    tracing::info!("Received GET /api/normalize request");
    handle_normalize_request(state, params).await
}

pub async fn post_normalize_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(params): Json<AmountParams>,
) -> Json<Value> {
    tracing::info!("Received POST /api/normalize request");
    handle_normalize_request(state, params).await
}

pub fn create_normalize_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/normalize", get(get_normalize_handler).post(post_normalize_handler))
        .layer(Extension(state))
}
