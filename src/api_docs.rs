use utoipa::OpenApi;
use crate::controllers::solar_controller;
use crate::models::solar;
use crate::shared_state;

#[derive(OpenApi)]
#[openapi(
    paths(
        solar_controller::get_state,
        solar_controller::post_config,
        solar_controller::refresh_weather,
        solar_controller::get_series
    ),
    components(
        schemas(
            solar::StateResponse,
            solar::ConfigUpdate,
            solar::ConfigResponse,
            solar::RefreshResponse,
            solar::SeriesResponse,
            solar::HistoryPoint,
            solar::YieldEstimate,
            shared_state::StationState
        )
    ),
    tags(
        (name = "solar-tracker-sim", description = "Solar Tracker & Yield Estimation API")
    )
)]
pub struct ApiDoc;
