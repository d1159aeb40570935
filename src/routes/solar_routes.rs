use axum::{routing::{get, post}, Router};
use crate::controllers::solar_controller::{
    get_series, get_state, post_config, refresh_weather,
};
use crate::shared_state::SharedState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>` and/or `State<EnvironmentProviders>`
/// via `FromRef<SharedState>` — a single `.with_state(shared)` covers both.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/state",           get(get_state))
        .route("/config",          post(post_config))
        .route("/refresh_weather", get(refresh_weather).post(refresh_weather))
        .route("/series",          get(get_series))
        .with_state(shared)
}
