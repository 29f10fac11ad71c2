//src/api.rs
use axum::Router;
use std::sync::Arc;
use crate::load_resources::AppState;
use crate::paths::format::create_format_routes;
use crate::paths::normalize::create_normalize_routes;
use crate::paths::resources::create_resource_routes;

pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_resource_routes(Arc::clone(&state)))
        .merge(create_format_routes(Arc::clone(&state)))
        .merge(create_normalize_routes(Arc::clone(&state)))
}
