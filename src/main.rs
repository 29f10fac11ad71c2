use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Context;
use tokio::task;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{TraceLayer, DefaultMakeSpan};
use tracing::{info, Level, Span};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use axum::{Server, Router};
use axum::http::Request;
use api::create_api_routes;
use load_resources::{create_app_state, load_settings, reload_resources};

pub mod api;
pub mod create_clients;
pub mod load_resources;
pub mod paths;
pub mod services;
pub mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "./config".to_string()));
    let settings = load_settings(&config_dir)?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listenAddr: {}", settings.listen_addr))?;

    let state = Arc::new(create_app_state(config_dir, settings)?);

    let state_clone = Arc::clone(&state);
    task::spawn(async move {
        reload_resources(state_clone).await;
    });

    let app = Router::new()
        .merge(create_api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http()
                    .on_request(|request: &Request<_>, _span: &Span| {
                        tracing::info!(
                            "Received a request: {} {}",
                            request.method(),
                            request.uri().path()
                        );
                    })
                    .make_span_with(DefaultMakeSpan::new()
                        .level(Level::INFO)
                    )
                )
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    info!("Server running on http://{}", addr);

    let server = Server::bind(&addr).serve(app.into_make_service());

    tokio::select! {
        result = server => {
            result.context("Server error")?;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
