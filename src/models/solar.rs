use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Core value types ────────────────────────────────────────────────────────

/// Observer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPosition {
    /// Latitude, −90 … +90 (north positive)
    pub latitude: f64,
    /// Longitude, −180 … +180 (east positive)
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Sun position as seen by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SolarAngles {
    /// Angle above the horizon; negative at night
    pub elevation_deg: f64,
    /// Compass bearing, clockwise from true north, in [0, 360)
    pub azimuth_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingMode {
    Auto,
    Manual,
}

impl TrackingMode {
    pub fn from_auto_flag(auto: bool) -> Self {
        if auto { TrackingMode::Auto } else { TrackingMode::Manual }
    }
}

/// Panel description fed to the yield model.
///
/// In `Auto` mode the target angles follow the sun; build it with
/// [`PanelConfig::resolve`] so the two stay consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelConfig {
    pub capacity_kw: f64,
    pub target_tilt_deg: f64,
    pub target_azimuth_deg: f64,
    pub tracking_mode: TrackingMode,
}

impl PanelConfig {
    /// Picks the target orientation for the given tracking mode.
    pub fn resolve(
        capacity_kw: f64,
        mode: TrackingMode,
        manual_tilt_deg: f64,
        manual_azimuth_deg: f64,
        sun: SolarAngles,
    ) -> Self {
        let (target_tilt_deg, target_azimuth_deg) = match mode {
            TrackingMode::Auto => (sun.elevation_deg, sun.azimuth_deg),
            TrackingMode::Manual => (manual_tilt_deg, manual_azimuth_deg),
        };
        Self {
            capacity_kw,
            target_tilt_deg,
            target_azimuth_deg,
            tracking_mode: mode,
        }
    }
}

pub const DEFAULT_SUN_HOURS: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    pub cloud_pct: f64,
    pub air_quality_index: f64,
    pub assumed_sun_hours: f64,
}

impl EnvironmentReading {
    pub fn new(cloud_pct: f64, air_quality_index: f64) -> Self {
        Self {
            cloud_pct,
            air_quality_index,
            assumed_sun_hours: DEFAULT_SUN_HOURS,
        }
    }

    pub fn with_sun_hours(mut self, hours: f64) -> Self {
        self.assumed_sun_hours = hours;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct YieldEstimate {
    pub daily_kwh: f64,
    pub annual_kwh: f64,
    #[serde(rename = "co2_tonnes")]
    pub co2_tonnes_per_year: f64,
}

// ─── Provider wire types ─────────────────────────────────────────────────────

/// OpenWeatherMap `/data/2.5/weather` (subset)
#[derive(Debug, Deserialize)]
pub struct OwmResponse {
    #[serde(default)]
    pub main: Option<OwmMain>,
    #[serde(default)]
    pub clouds: Option<OwmClouds>,
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OwmClouds {
    pub all: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OwmCondition {
    #[serde(default)]
    pub description: String,
}

/// WAQI geo feed (subset). `data` is a string on error responses.
#[derive(Debug, Deserialize)]
pub struct WaqiResponse {
    pub status: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Normalised weather reading from a provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherReading {
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub cloud_pct: Option<f64>,
    pub weather_desc: Option<String>,
}

// ─── REST API types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SolarView {
    pub elevation: f64,
    pub azimuth: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TargetView {
    pub tilt: f64,
    pub az: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherView {
    pub cloud_pct: f64,
    pub aqi: f64,
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub desc: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StateResponse {
    pub auto: bool,
    pub lat: f64,
    pub lon: f64,
    pub now_utc: String,
    pub solar: SolarView,
    pub target: TargetView,
    pub panel_kw: f64,
    pub weather: WeatherView,
    pub energy: YieldEstimate,
}

/// Partial update of the station. Missing or `null` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfigUpdate {
    pub auto: Option<bool>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub panel_kw: Option<f64>,
    pub cloud_pct: Option<f64>,
    pub aqi: Option<f64>,
    pub tilt: Option<f64>,
    pub az: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    pub ok: bool,
    pub state: crate::shared_state::StationState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub ok: bool,
    pub state: WeatherView,
}

/// One time-series sample, recorded per `/api/state` evaluation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryPoint {
    /// Unix epoch milliseconds
    pub ts: i64,
    pub elevation: f64,
    pub azimuth: f64,
    pub tilt: f64,
    pub cloud_pct: i64,
    pub aqi: i64,
    pub power_w: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeriesResponse {
    pub ok: bool,
    pub total_kwh: f64,
    pub points: Vec<HistoryPoint>,
}
