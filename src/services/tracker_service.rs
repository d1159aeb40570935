use chrono::{DateTime, Utc};

use crate::config::ModelConfig;
use crate::models::solar::{
    EnvironmentReading, GeoPosition, HistoryPoint, PanelConfig, SolarAngles, StateResponse,
    SolarView, TargetView, TrackingMode, YieldEstimate,
};
use crate::services::{ephemeris, yield_estimator};
use crate::shared_state::StationState;

/// Result of one evaluation of the station at an instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub at: DateTime<Utc>,
    pub sun: SolarAngles,
    pub panel: PanelConfig,
    pub env: EnvironmentReading,
    pub energy: YieldEstimate,
}

/// Sun position → target orientation → yield. No side effects.
pub fn evaluate(station: &StationState, model: &ModelConfig, now: DateTime<Utc>) -> Evaluation {
    let sun = ephemeris::compute_solar_angles(GeoPosition::new(station.lat, station.lon), now);
    let panel = PanelConfig::resolve(
        station.panel_kw,
        TrackingMode::from_auto_flag(station.auto),
        station.tilt,
        station.az,
        sun,
    );
    let env = EnvironmentReading::new(station.cloud_pct, station.aqi)
        .with_sun_hours(model.assumed_sun_hours);
    let energy = yield_estimator::estimate_yield(&panel, sun, &env, model.grid_emission_factor);

    #[cfg(feature = "verbose_log")]
    tracing::debug!(
        "[STATE] el={:.2}° az={:.2}° tilt={:.2}° cloud={}% aqi={} → {:.2} kWh/day",
        sun.elevation_deg, sun.azimuth_deg, panel.target_tilt_deg,
        station.cloud_pct, station.aqi, energy.daily_kwh
    );

    Evaluation { at: now, sun, panel, env, energy }
}

fn round2(x: f64) -> f64 {
    yield_estimator::round_to(x, 2)
}

impl Evaluation {
    pub fn to_response(&self, station: &StationState) -> StateResponse {
        StateResponse {
            auto: station.auto,
            lat: station.lat,
            lon: station.lon,
            now_utc: self.at.to_rfc3339(),
            solar: SolarView {
                elevation: round2(self.sun.elevation_deg),
                azimuth: round2(self.sun.azimuth_deg),
            },
            target: TargetView {
                tilt: round2(self.panel.target_tilt_deg),
                az: round2(self.panel.target_azimuth_deg),
            },
            panel_kw: station.panel_kw,
            weather: station.weather_view(),
            energy: self.energy,
        }
    }

    /// Dashboard sample. The daily figure is reused as a nominal
    /// instantaneous power, and each sample counts as one minute.
    pub fn history_point(&self) -> HistoryPoint {
        let kwh = self.energy.daily_kwh;
        HistoryPoint {
            ts: self.at.timestamp_millis(),
            elevation: round2(self.sun.elevation_deg),
            azimuth: round2(self.sun.azimuth_deg),
            tilt: round2(self.panel.target_tilt_deg),
            cloud_pct: self.env.cloud_pct.trunc() as i64,
            aqi: self.env.air_quality_index.trunc() as i64,
            power_w: (kwh * 1000.0).max(0.0),
            energy_kwh: (kwh / 60.0).max(0.0),
        }
    }
}

/// Sum of per-sample energy, rounded to 0.001 kWh.
pub fn total_energy_kwh(points: &[HistoryPoint]) -> f64 {
    let total: f64 = points.iter().map(|p| p.energy_kwh).sum();
    yield_estimator::round_to(total, 3)
}
