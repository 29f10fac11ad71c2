//src/paths/resources.rs
use axum::{Json, Router, routing::get, http::StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use crate::load_resources::AppState;
use crate::utils::fetch_token_details::group_tokens_by_chain;

// Define the GET /api/chains route
pub async fn get_chains(state: Arc<AppState>) -> Result<Json<Value>, StatusCode> {
    info!("Received GET request for /api/chains");
    Ok(Json(json!({ "chains": state.chains })))
}

// Define the GET /api/tokens route
pub async fn get_tokens(state: Arc<AppState>) -> Result<Json<Value>, StatusCode> {
    info!("Received GET request for /api/tokens");
    if state.tokens.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "tokens": group_tokens_by_chain(&state.tokens) })))
}

// Define the GET /api/rates route
pub async fn get_rates(state: Arc<AppState>) -> Result<Json<Value>, StatusCode> {
    info!("Received GET request for /api/rates");
    let rates: BTreeMap<String, f64> = state
        .rates
        .iter()
        .map(|entry| (entry.key().clone(), *entry.value()))
        .collect();
    Ok(Json(json!(rates)))
}

// Create a router for resource-related routes
pub fn create_resource_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chains", get({
            let state = Arc::clone(&state);
            move || get_chains(state)
        }))
        .route("/api/tokens", get({
            let state = Arc::clone(&state);
            move || get_tokens(state)
        }))
        .route("/api/rates", get({
            let state = Arc::clone(&state);
            move || get_rates(state)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_resources::test_state;

    #[tokio::test]
    async fn chains_are_listed() {
        let Json(body) = get_chains(Arc::new(test_state())).await.unwrap();
        assert_eq!(body["chains"][0]["id"], json!(1));
        assert_eq!(body["chains"][0]["nativeSymbol"], json!("ETH"));
    }

    #[tokio::test]
    async fn tokens_grouped_by_chain() {
        let Json(body) = get_tokens(Arc::new(test_state())).await.unwrap();
        assert_eq!(body["tokens"]["1"][0]["symbol"], json!("USDC"));
        assert_eq!(body["tokens"]["1"][0]["decimals"], json!(6));
    }

    #[tokio::test]
    async fn empty_token_map_is_not_found() {
        let state = test_state();
        state.tokens.clear();
        assert_eq!(get_tokens(Arc::new(state)).await.unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rates_are_listed() {
        let Json(body) = get_rates(Arc::new(test_state())).await.unwrap();
        assert_eq!(body, json!({"usdc": 1.0}));
    }
}
