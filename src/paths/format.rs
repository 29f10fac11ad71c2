//src/paths/format.rs
use axum::{Json, Router, routing::{get, post}, extract::{Extension, Query}};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use crate::load_resources::AppState;
use crate::paths::validate_params::validate_amount_params;
use crate::services::format_service::process_format;
use crate::utils::serializer::{failure_response, success_response};

const MAX_BATCH_SIZE: usize = 100;

/// Query/body parameters shared by the format and normalize endpoints.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AmountParams {
    #[serde(deserialize_with = "crate::paths::utils::deserialization_helpers::number_to_string")]
    pub amount: String,
    #[serde(deserialize_with = "crate::paths::utils::deserialization_helpers::string_or_number_to_option_u8", default)]
    pub decimals: Option<u8>,
    #[serde(deserialize_with = "crate::paths::utils::deserialization_helpers::string_or_number_to_option_u64", default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub token_address: Option<String>,
}

async fn format_one(params: &AmountParams, state: &Arc<AppState>) -> Result<Value, String> {
    let validation = validate_amount_params(params, state);
    if !validation.valid {
        return Err(validation.message);
    }

    let formatted = process_format(params, state).await?;
    serde_json::to_value(formatted).map_err(|e| e.to_string())
}

async fn handle_format_request(state: Arc<AppState>, params: AmountParams) -> Json<Value> {
    match format_one(&params, &state).await {
        Ok(data) => Json(success_response(data)),
        Err(message) => {
            error!("Format request failed: {}", message);
            Json(failure_response(message))
        }
    }
}

pub async fn get_format_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AmountParams>,
) -> Json<Value> {
    tracing::info!("Received GET /api/format request");
    handle_format_request(state, params).await
}

pub async fn post_format_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(params): Json<AmountParams>,
) -> Json<Value> {
    tracing::info!("Received POST /api/format request");
    handle_format_request(state, params).await
}

pub async fn post_format_batch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(batch): Json<Vec<AmountParams>>,
) -> Json<Value> {
    tracing::info!("Received POST /api/format/batch request with {} items", batch.len());

    if batch.len() > MAX_BATCH_SIZE {
        return Json(failure_response(format!("Batch too large: {} items (max {})", batch.len(), MAX_BATCH_SIZE)));
    }

    let results = join_all(batch.iter().map(|params| format_one(params, &state))).await;
    let items = results
        .into_iter()
        .map(|result| match result {
            Ok(data) => data,
            Err(message) => failure_response(message),
        })
        .collect();

    Json(success_response(Value::Array(items)))
}

pub fn create_format_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/format", get(get_format_handler).post(post_format_handler))
        .route("/api/format/batch", post(post_format_batch_handler))
        .layer(Extension(state))
}
