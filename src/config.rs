use serde::Deserialize;

use crate::errors::ConfigError;

fn default_port() -> u16 { 5000 }
fn default_history_capacity() -> usize { 2000 }

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            station: StationConfig::default(),
            providers: ProvidersConfig::default(),
            model: ModelConfig::default(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// Initial station setup. Mutable at runtime through `POST /api/config`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StationConfig {
    /// Track the sun (true) or hold `tilt_deg`/`azimuth_deg` (false)
    pub auto: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub tilt_deg: f64,
    /// 0=N, 90=E, 180=S, 270=W
    pub azimuth_deg: f64,
    pub panel_kw: f64,
    /// Fallback readings used until a provider answers
    pub cloud_pct: f64,
    pub aqi: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        // New Delhi
        Self {
            auto: true,
            latitude: 28.6139,
            longitude: 77.2090,
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
            panel_kw: 1.0,
            cloud_pct: 20.0,
            aqi: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenWeatherMap key; falls back to `WEATHER_API_KEY`
    pub weather_api_key: Option<String>,
    /// WAQI token; falls back to `AQI_API_KEY`
    pub aqi_token: Option<String>,
    pub weather_base_url: String,
    pub aqi_base_url: String,
    pub refresh_interval_s: u64,
    pub timeout_s: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            aqi_token: None,
            weather_base_url: "https://api.openweathermap.org".to_string(),
            aqi_base_url: "https://api.waqi.info".to_string(),
            refresh_interval_s: 600,
            timeout_s: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub assumed_sun_hours: f64,
    /// kg CO₂ per kWh of grid electricity displaced
    pub grid_emission_factor: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            assumed_sun_hours: crate::models::solar::DEFAULT_SUN_HOURS,
            grid_emission_factor: crate::services::yield_estimator::DEFAULT_GRID_EMISSION_FACTOR,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut config = Self::from_json(&content)?;
        config.providers.fill_from_env();
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

impl ProvidersConfig {
    fn fill_from_env(&mut self) {
        let from_env = |var: &str| std::env::var(var).ok().filter(|v| !v.is_empty());
        if self.weather_api_key.as_deref().is_none_or(str::is_empty) {
            self.weather_api_key = from_env("WEATHER_API_KEY");
        }
        if self.aqi_token.as_deref().is_none_or(str::is_empty) {
            self.aqi_token = from_env("AQI_API_KEY");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let c = Config::from_json("{}").unwrap();
        assert_eq!(c.server.port, 5000);
        assert_eq!(c.history_capacity, 2000);
        assert!(c.station.auto);
        assert_eq!(c.station.latitude, 28.6139);
        assert_eq!(c.providers.refresh_interval_s, 600);
        assert_eq!(c.model.assumed_sun_hours, 5.5);
        assert_eq!(c.model.grid_emission_factor, 0.7);
    }

    #[test]
    fn test_partial_sections() {
        let c = Config::from_json(r#"{
            "server": { "port": 8080 },
            "station": { "auto": false, "tilt_deg": 12.5 },
            "model": { "grid_emission_factor": 0.45 }
        }"#).unwrap();
        assert_eq!(c.server.port, 8080);
        assert!(!c.station.auto);
        assert_eq!(c.station.tilt_deg, 12.5);
        assert_eq!(c.station.panel_kw, 1.0);
        assert_eq!(c.model.grid_emission_factor, 0.45);
        assert_eq!(c.model.assumed_sun_hours, 5.5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load("/nonexistent/solar-config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "got {err}");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Config::from_json("{ nope"), Err(ConfigError::Json(_))));
    }
}
