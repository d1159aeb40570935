use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use axum::extract::FromRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::Config;
use crate::models::solar::{ConfigUpdate, HistoryPoint, WeatherReading, WeatherView};
use crate::services::weather_service::EnvironmentProviders;

/// Caller-owned station setup plus the last-known-good environment readings.
/// Snapshots of this are passed by value into each evaluation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StationState {
    pub auto: bool,
    pub lat: f64,
    pub lon: f64,
    pub tilt: f64,
    pub az: f64,
    pub panel_kw: f64,
    pub cloud_pct: f64,
    pub aqi: f64,
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub weather_desc: Option<String>,
    /// Last provider refresh, `None` until the first one
    pub last_fetch: Option<DateTime<Utc>>,
}

impl StationState {
    pub fn from_config(config: &Config) -> Self {
        let s = &config.station;
        Self {
            auto: s.auto,
            lat: s.latitude,
            lon: s.longitude,
            tilt: s.tilt_deg,
            az: s.azimuth_deg,
            panel_kw: s.panel_kw,
            cloud_pct: s.cloud_pct,
            aqi: s.aqi,
            temp_c: None,
            humidity: None,
            weather_desc: None,
            last_fetch: None,
        }
    }

    pub fn apply_update(&mut self, update: &ConfigUpdate) {
        if let Some(v) = update.auto { self.auto = v; }
        if let Some(v) = update.lat { self.lat = v; }
        if let Some(v) = update.lon { self.lon = v; }
        if let Some(v) = update.panel_kw { self.panel_kw = v; }
        if let Some(v) = update.cloud_pct { self.cloud_pct = v; }
        if let Some(v) = update.aqi { self.aqi = v; }
        if let Some(v) = update.tilt { self.tilt = v; }
        if let Some(v) = update.az { self.az = v; }
    }

    /// Merge a weather reading; a missing cloud value keeps the previous one.
    pub fn apply_weather(&mut self, w: WeatherReading) {
        if let Some(cloud) = w.cloud_pct {
            self.cloud_pct = cloud;
        }
        self.temp_c = w.temp_c;
        self.humidity = w.humidity;
        self.weather_desc = w.weather_desc;
    }

    /// Zero or negative AQI values are treated as "no data".
    pub fn apply_aqi(&mut self, aqi: i64) {
        if aqi > 0 {
            self.aqi = aqi as f64;
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>, interval_s: u64) -> bool {
        match self.last_fetch {
            None => true,
            Some(t) => (now - t).num_seconds() >= interval_s as i64,
        }
    }

    pub fn weather_view(&self) -> WeatherView {
        WeatherView {
            cloud_pct: self.cloud_pct,
            aqi: self.aqi,
            temp_c: self.temp_c,
            humidity: self.humidity,
            desc: self.weather_desc.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub station: Arc<RwLock<StationState>>,
    /// Ring buffer of recent evaluations, oldest first
    pub history: Arc<RwLock<VecDeque<HistoryPoint>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let station = StationState::from_config(&config);
        let capacity = config.history_capacity;
        Self {
            config: Arc::new(config),
            station: Arc::new(RwLock::new(station)),
            history: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn station(&self) -> StationState {
        match self.station.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Runs `f` under the write lock and returns the resulting snapshot.
    pub fn update_station<F>(&self, f: F) -> StationState
    where
        F: FnOnce(&mut StationState),
    {
        let mut guard = match self.station.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut *guard);
        guard.clone()
    }

    pub fn push_history(&self, point: HistoryPoint) {
        let capacity = self.config.history_capacity;
        if capacity == 0 {
            return;
        }
        if let Ok(mut h) = self.history.write() {
            while h.len() >= capacity {
                h.pop_front();
            }
            h.push_back(point);
        }
    }

    pub fn history(&self) -> Vec<HistoryPoint> {
        if let Ok(h) = self.history.read() {
            h.iter().cloned().collect()
        } else {
            Vec::new()
        }
    }
}

/// Router state. Handlers extract `State<AppState>` and/or
/// `State<EnvironmentProviders>` through `FromRef`.
#[derive(Clone, Debug)]
pub struct SharedState {
    pub app: AppState,
    pub providers: EnvironmentProviders,
}

impl FromRef<SharedState> for AppState {
    fn from_ref(s: &SharedState) -> Self {
        s.app.clone()
    }
}

impl FromRef<SharedState> for EnvironmentProviders {
    fn from_ref(s: &SharedState) -> Self {
        s.providers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(ts: i64) -> HistoryPoint {
        HistoryPoint {
            ts,
            elevation: 10.0,
            azimuth: 100.0,
            tilt: 10.0,
            cloud_pct: 0,
            aqi: 50,
            power_w: 5500.0,
            energy_kwh: 5.5 / 60.0,
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let config = Config { history_capacity: 3, ..Config::default() };
        let state = AppState::new(config);
        for ts in 0..5 {
            state.push_history(point(ts));
        }
        let ts: Vec<i64> = state.history().iter().map(|p| p.ts).collect();
        assert_eq!(ts, vec![2, 3, 4], "oldest samples must be evicted first");
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let state = AppState::new(Config::default());
        let update = ConfigUpdate { auto: Some(false), tilt: Some(42.0), ..Default::default() };
        let s = state.update_station(|s| s.apply_update(&update));
        assert!(!s.auto);
        assert_eq!(s.tilt, 42.0);
        assert_eq!(s.az, 180.0);
        assert_eq!(s.lat, 28.6139);
        assert_eq!(state.station().tilt, 42.0);
    }

    #[test]
    fn test_fractional_readings_accepted() {
        let update: ConfigUpdate = serde_json::from_str(r#"{"cloud_pct": 35.5, "aqi": 72.4, "tilt": 0}"#).unwrap();
        let mut s = StationState::from_config(&Config::default());
        s.apply_update(&update);
        assert_eq!(s.cloud_pct, 35.5);
        assert_eq!(s.aqi, 72.4);
        assert_eq!(s.tilt, 0.0, "zero is a value, not a missing field");
        assert_eq!(s.az, 180.0);
    }

    #[test]
    fn test_weather_without_clouds_keeps_last_value() {
        let mut s = StationState::from_config(&Config::default());
        s.apply_weather(WeatherReading {
            temp_c: Some(31.0),
            humidity: Some(40.0),
            cloud_pct: None,
            weather_desc: Some("Haze".into()),
        });
        assert_eq!(s.cloud_pct, 20.0);
        assert_eq!(s.temp_c, Some(31.0));
        assert_eq!(s.weather_desc.as_deref(), Some("Haze"));
    }

    #[test]
    fn test_non_positive_aqi_ignored() {
        let mut s = StationState::from_config(&Config::default());
        s.apply_aqi(0);
        assert_eq!(s.aqi, 60.0);
        s.apply_aqi(153);
        assert_eq!(s.aqi, 153.0);
    }

    #[test]
    fn test_staleness() {
        let mut s = StationState::from_config(&Config::default());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(s.is_stale(now, 600), "never fetched is always stale");
        s.last_fetch = Some(now);
        assert!(!s.is_stale(now + Duration::seconds(599), 600));
        assert!(s.is_stale(now + Duration::seconds(600), 600));
    }
}
