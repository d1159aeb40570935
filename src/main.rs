mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod errors;

use std::net::SocketAddr;
use axum::{Router, routing::get, response::Html};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::controllers::solar_controller;
use crate::routes::solar_routes::api_routes;
use crate::services::weather_service::EnvironmentProviders;
use crate::shared_state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load configuration
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load {}: {}", config_path, e);
            return;
        }
    };
    info!(
        "[CONFIG] station ({}, {}) {} kW, auto={}, weather={}, aqi={}",
        config.station.latitude,
        config.station.longitude,
        config.station.panel_kw,
        config.station.auto,
        if config.providers.weather_api_key.is_some() { "on" } else { "off" },
        if config.providers.aqi_token.is_some() { "on" } else { "off" },
    );

    // 2. Initialize shared state
    let providers = match EnvironmentProviders::new(config.providers.clone()) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };
    let server_port = config.server.port;
    let shared = SharedState {
        app: AppState::new(config),
        providers,
    };

    // 3. Start Axum HTTP server
    let app = Router::new()
        .route("/", get(solar_controller::index))
        .route_service("/legacy", ServeFile::new("static/legacy.html"))
        .nest("/api", api_routes(shared))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .fallback_service(ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], server_port));
    info!("API Server listening on http://{}", addr);
    info!("Dashboard: http://{}/legacy", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
    {
        error!("Server error: {}", e);
    }
}
