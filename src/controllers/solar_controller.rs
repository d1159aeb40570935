use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::models::solar::{
    ConfigResponse, ConfigUpdate, RefreshResponse, SeriesResponse, StateResponse,
};
use crate::services::tracker_service;
use crate::services::weather_service::{self, EnvironmentProviders};
use crate::shared_state::AppState;

/// GET /
/// The dashboard lives at `/legacy`.
pub async fn index() -> Redirect {
    Redirect::to("/legacy")
}

/// GET /api/state
/// Current station state, sun position, target orientation and energy estimate
///
/// Refreshes weather/AQI if the last reading is older than the configured
/// interval, evaluates the sun position for "now" and records a sample in the
/// time series.
#[utoipa::path(
    get,
    path = "/api/state",
    responses(
        (status = 200, description = "Current state and estimate", body = StateResponse)
    )
)]
pub async fn get_state(
    State(state): State<AppState>,
    State(providers): State<EnvironmentProviders>,
) -> impl IntoResponse {
    let now = Utc::now();
    let station = weather_service::refresh_if_stale(&state, &providers, false, now).await;

    let eval = tracker_service::evaluate(&station, &state.config.model, now);
    state.push_history(eval.history_point());

    Json(eval.to_response(&station)).into_response()
}

/// POST /api/config
/// Update station configuration
///
/// Accepts any subset of `auto`, `lat`, `lon`, `panel_kw`, `cloud_pct`, `aqi`,
/// `tilt`, `az`. Missing or null fields are left unchanged. Weather is
/// re-fetched immediately since it may depend on the new position.
#[utoipa::path(
    post,
    path = "/api/config",
    request_body = ConfigUpdate,
    responses(
        (status = 200, description = "Updated station state", body = ConfigResponse),
        (status = 400, description = "Malformed JSON body")
    )
)]
pub async fn post_config(
    State(state): State<AppState>,
    State(providers): State<EnvironmentProviders>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    state.update_station(|s| s.apply_update(&update));
    info!("[CONFIG] station updated: {:?}", update);

    let station = weather_service::refresh_if_stale(&state, &providers, true, Utc::now()).await;
    Json(ConfigResponse { ok: true, state: station }).into_response()
}

/// GET|POST /api/refresh_weather
/// Force-refresh weather and AQI now
#[utoipa::path(
    post,
    path = "/api/refresh_weather",
    responses(
        (status = 200, description = "Latest environment readings", body = RefreshResponse)
    )
)]
pub async fn refresh_weather(
    State(state): State<AppState>,
    State(providers): State<EnvironmentProviders>,
) -> impl IntoResponse {
    let station = weather_service::refresh_if_stale(&state, &providers, true, Utc::now()).await;
    Json(RefreshResponse { ok: true, state: station.weather_view() }).into_response()
}

/// GET /api/series
/// Recent time-series samples
///
/// Returns the buffered samples (oldest first) and their summed energy.
#[utoipa::path(
    get,
    path = "/api/series",
    responses(
        (status = 200, description = "Recorded samples", body = SeriesResponse)
    )
)]
pub async fn get_series(State(state): State<AppState>) -> impl IntoResponse {
    let points = state.history();
    let total_kwh = tracker_service::total_energy_kwh(&points);
    Json(SeriesResponse { ok: true, total_kwh, points }).into_response()
}
