use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::ProvidersConfig;
use crate::errors::ProviderError;
use crate::models::solar::{OwmResponse, WaqiResponse, WeatherReading};
use crate::shared_state::{AppState, StationState};

/// Weather (OpenWeatherMap) and air-quality (WAQI) clients.
///
/// A provider without a key is disabled and answers `Ok(None)`.
#[derive(Clone, Debug)]
pub struct EnvironmentProviders {
    client: Client,
    cfg: ProvidersConfig,
}

impl EnvironmentProviders {
    pub fn new(cfg: ProvidersConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_s.max(1)))
            .build()?;
        Ok(Self { client, cfg })
    }

    fn key(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|k| !k.is_empty())
    }

    /// Current weather at the given position.
    pub async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<Option<WeatherReading>, ProviderError> {
        let Some(key) = Self::key(&self.cfg.weather_api_key) else {
            return Ok(None);
        };
        let url = format!("{}/data/2.5/weather", self.cfg.weather_base_url.trim_end_matches('/'));
        let resp = self.client.get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", key.to_string()),
            ])
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        let body = resp.text().await?;
        parse_weather(&body).map(Some)
    }

    /// Current AQI at the given position.
    pub async fn fetch_aqi(&self, lat: f64, lon: f64) -> Result<Option<i64>, ProviderError> {
        let Some(token) = Self::key(&self.cfg.aqi_token) else {
            return Ok(None);
        };
        let url = format!(
            "{}/feed/geo:{};{}/",
            self.cfg.aqi_base_url.trim_end_matches('/'), lat, lon
        );
        let resp = self.client.get(&url).query(&[("token", token)]).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        let body = resp.text().await?;
        parse_aqi(&body).map(Some)
    }
}

pub fn parse_weather(body: &str) -> Result<WeatherReading, ProviderError> {
    let r: OwmResponse = serde_json::from_str(body)?;
    let (temp_c, humidity) = r.main.map(|m| (m.temp, m.humidity)).unwrap_or((None, None));
    Ok(WeatherReading {
        temp_c,
        humidity,
        cloud_pct: r.clouds.and_then(|c| c.all).map(f64::trunc),
        weather_desc: Some(
            r.weather.first().map(|w| title_case(&w.description)).unwrap_or_default(),
        ),
    })
}

/// AQI from a WAQI feed payload. A non-numeric AQI (WAQI sends `"-"` when a
/// station has no data) reads as 0.
pub fn parse_aqi(body: &str) -> Result<i64, ProviderError> {
    let r: WaqiResponse = serde_json::from_str(body)?;
    if r.status != "ok" {
        let msg = r.data.as_str().unwrap_or(r.status.as_str()).to_string();
        return Err(ProviderError::Provider(msg));
    }
    let aqi = &r.data["aqi"];
    Ok(aqi.as_i64()
        .or_else(|| aqi.as_f64().map(|v| v as i64))
        .or_else(|| aqi.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or(0))
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Refresh weather/AQI no more than once per `refresh_interval_s` unless
/// `force`. Provider failures keep the last-known-good values.
pub async fn refresh_if_stale(
    state: &AppState,
    providers: &EnvironmentProviders,
    force: bool,
    now: DateTime<Utc>,
) -> StationState {
    let snapshot = state.station();
    let interval = state.config.providers.refresh_interval_s;
    if !force && !snapshot.is_stale(now, interval) {
        return snapshot;
    }
    let (lat, lon) = (snapshot.lat, snapshot.lon);

    let (weather, aqi) = tokio::join!(
        providers.fetch_weather(lat, lon),
        providers.fetch_aqi(lat, lon),
    );

    let weather = match weather {
        Ok(w) => w,
        Err(e) => {
            warn!("[WEATHER] fetch failed for ({lat}, {lon}): {e}");
            None
        }
    };
    let aqi = match aqi {
        Ok(a) => a,
        Err(e) => {
            warn!("[AQI] fetch failed for ({lat}, {lon}): {e}");
            None
        }
    };

    state.update_station(|s| {
        if !merge_readings(s, (lat, lon), weather, aqi, now) {
            debug!("[WEATHER] station moved during fetch, dropping readings for ({lat}, {lon})");
        }
    })
}

/// Applies readings fetched for `at` unless the station has since moved.
/// Returns whether they were applied.
pub(crate) fn merge_readings(
    s: &mut StationState,
    at: (f64, f64),
    weather: Option<WeatherReading>,
    aqi: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    if (s.lat, s.lon) != at {
        return false;
    }
    if let Some(w) = weather {
        info!("[WEATHER] cloud={:?}% temp={:?}°C desc={:?}", w.cloud_pct, w.temp_c, w.weather_desc);
        s.apply_weather(w);
    }
    if let Some(a) = aqi {
        debug!("[AQI] reading {a}");
        s.apply_aqi(a);
    }
    s.last_fetch = Some(now);
    true
}
