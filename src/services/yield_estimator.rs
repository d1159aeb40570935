/// Daily PV yield model.
///
/// P_day = capacity × sun_hours × f_tilt × f_cloud × f_aqi
///
/// Every factor is clamped into a fixed band so extreme inputs degrade the
/// estimate instead of rejecting it. Annual figures are a flat ×365 scale-up
/// of the daily value (no seasonality).

use crate::models::solar::{
    EnvironmentReading, PanelConfig, SolarAngles, YieldEstimate, DEFAULT_SUN_HOURS,
};

pub const DEFAULT_GRID_EMISSION_FACTOR: f64 = 0.7; // kg CO₂ / kWh
const DAYS_PER_YEAR: f64 = 365.0;

const TILT_FULL_LOSS_DEG: f64 = 60.0;
const AQI_MIN: f64 = 20.0;
const AQI_MAX: f64 = 400.0;
const AQI_NEUTRAL: f64 = 50.0;

/// Decimal rounding, ties to even.
#[inline]
pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (x * p).round_ties_even() / p
}

// Negative → 0, NaN passes through.
#[inline]
fn non_negative(x: f64) -> f64 {
    if x < 0.0 { 0.0 } else { x }
}

/// 1.0 when the panel points at the sun, down to 0.4 at ≥60° mismatch.
pub fn tilt_factor(elevation_deg: f64, target_tilt_deg: f64) -> f64 {
    let error = (elevation_deg - target_tilt_deg).abs();
    (1.0 - error / TILT_FULL_LOSS_DEG).clamp(0.4, 1.0)
}

/// Overcast sky still lets diffuse light through, hence the 0.2 floor.
pub fn cloud_factor(cloud_pct: f64) -> f64 {
    (1.0 - cloud_pct / 100.0).clamp(0.2, 1.0)
}

/// AQI 50 → 1.0, AQI 400 → 0.6. Clean air is not rewarded above 1.0.
pub fn aqi_factor(aqi: f64) -> f64 {
    let aqi = aqi.clamp(AQI_MIN, AQI_MAX);
    (1.0 - (aqi - AQI_NEUTRAL) / 500.0).clamp(0.6, 1.0)
}

/// Flat-argument form: daily kWh rounded to 0.01.
pub fn predict_kwh(
    capacity_kw: f64,
    elevation_deg: f64,
    target_tilt_deg: f64,
    cloud_pct: f64,
    aqi: f64,
    assumed_sun_hours: f64,
) -> f64 {
    let base = non_negative(capacity_kw) * non_negative(assumed_sun_hours);
    let kwh = base
        * tilt_factor(elevation_deg, target_tilt_deg)
        * cloud_factor(cloud_pct)
        * aqi_factor(aqi);
    round_to(kwh, 2)
}

/// Same as [`predict_kwh`] with the default 5.5 sun hours.
#[allow(dead_code)]
pub fn predict_kwh_default(
    capacity_kw: f64,
    elevation_deg: f64,
    target_tilt_deg: f64,
    cloud_pct: f64,
    aqi: f64,
) -> f64 {
    predict_kwh(capacity_kw, elevation_deg, target_tilt_deg, cloud_pct, aqi, DEFAULT_SUN_HOURS)
}

pub fn predict_daily_kwh(config: &PanelConfig, angles: SolarAngles, env: &EnvironmentReading) -> f64 {
    predict_kwh(
        config.capacity_kw,
        angles.elevation_deg,
        config.target_tilt_deg,
        env.cloud_pct,
        env.air_quality_index,
        env.assumed_sun_hours,
    )
}

pub fn annual_kwh(daily_kwh: f64) -> f64 {
    round_to(daily_kwh * DAYS_PER_YEAR, 1)
}

/// Tonnes of CO₂ avoided per year, rounded to 0.01.
pub fn annual_co2_savings(annual_kwh: f64, grid_emission_factor: f64) -> f64 {
    round_to(annual_kwh * grid_emission_factor / 1000.0, 2)
}

/// Daily → annual → CO₂ in one go.
pub fn estimate_yield(
    config: &PanelConfig,
    angles: SolarAngles,
    env: &EnvironmentReading,
    grid_emission_factor: f64,
) -> YieldEstimate {
    let daily_kwh = predict_daily_kwh(config, angles, env);
    let annual_kwh = annual_kwh(daily_kwh);
    YieldEstimate {
        daily_kwh,
        annual_kwh,
        co2_tonnes_per_year: annual_co2_savings(annual_kwh, grid_emission_factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::solar::TrackingMode;

    #[test]
    fn test_perfect_conditions_full_base() {
        let kwh = predict_kwh_default(1.0, 30.0, 30.0, 0.0, 50.0);
        assert_eq!(kwh, 5.5);
    }

    #[test]
    fn test_worst_case_hits_every_floor() {
        // 90° mismatch → 0.4, 100% cloud → 0.2, AQI 400 → 0.6
        let kwh = predict_kwh_default(1.0, 0.0, 90.0, 100.0, 400.0);
        assert_eq!(kwh, 0.26);
    }

    #[test]
    fn test_factor_bounds() {
        assert_eq!(tilt_factor(10.0, 10.0), 1.0);
        assert_eq!(tilt_factor(-90.0, 90.0), 0.4);
        assert!((tilt_factor(0.0, 30.0) - 0.5).abs() < 1e-12);

        assert_eq!(cloud_factor(0.0), 1.0);
        assert_eq!(cloud_factor(-50.0), 1.0);
        assert_eq!(cloud_factor(100.0), 0.2);
        assert_eq!(cloud_factor(250.0), 0.2);

        assert_eq!(aqi_factor(50.0), 1.0);
        assert_eq!(aqi_factor(0.0), 1.0, "clean air must not exceed 1.0");
        assert_eq!(aqi_factor(400.0), 0.6);
        assert_eq!(aqi_factor(5000.0), 0.6);
        assert!((aqi_factor(150.0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_in_each_penalty() {
        let mut prev = f64::INFINITY;
        for mismatch in 0..=120 {
            let kwh = predict_kwh_default(3.0, 40.0, 40.0 + mismatch as f64, 10.0, 80.0);
            assert!(kwh <= prev, "tilt mismatch {mismatch}: {kwh} > {prev}");
            prev = kwh;
        }

        let mut prev = f64::INFINITY;
        for cloud in 0..=100 {
            let kwh = predict_kwh_default(3.0, 40.0, 40.0, cloud as f64, 80.0);
            assert!(kwh <= prev, "cloud {cloud}: {kwh} > {prev}");
            prev = kwh;
        }

        let mut prev = f64::INFINITY;
        for aqi in 50..=500 {
            let kwh = predict_kwh_default(3.0, 40.0, 40.0, 10.0, aqi as f64);
            assert!(kwh <= prev, "aqi {aqi}: {kwh} > {prev}");
            prev = kwh;
        }
    }

    #[test]
    fn test_output_bounded_by_base() {
        for &(cap, el, tilt, cloud, aqi) in &[
            (2.0, 10.0, 10.0, -20.0, -5.0),
            (2.0, 80.0, -80.0, 300.0, 900.0),
            (-4.0, 30.0, 30.0, 0.0, 50.0),
        ] {
            let kwh = predict_kwh(cap, el, tilt, cloud, aqi, 5.5);
            assert!(kwh >= 0.0, "negative yield {kwh}");
            assert!(kwh <= cap.max(0.0) * 5.5 + 1e-9, "yield {kwh} above base");
        }
    }

    #[test]
    fn test_custom_sun_hours() {
        let kwh = predict_kwh(2.0, 20.0, 20.0, 0.0, 50.0, 4.0);
        assert_eq!(kwh, 8.0);
    }

    #[test]
    fn test_co2_savings() {
        assert_eq!(annual_co2_savings(2000.0, 0.7), 1.4);
        assert_eq!(annual_co2_savings(2000.0, DEFAULT_GRID_EMISSION_FACTOR), 1.4);
        assert_eq!(annual_co2_savings(0.0, 0.7), 0.0);
    }

    #[test]
    fn test_annualization() {
        assert_eq!(annual_kwh(5.5), 2007.5);
        assert_eq!(annual_kwh(0.26), 94.9);
    }

    #[test]
    fn test_annual_ties_round_to_even() {
        // 5.25 × 365 = 1916.25 exactly
        assert_eq!(predict_kwh_default(1.0, 30.0, 30.0, 0.0, 73.0), 5.25);
        assert_eq!(annual_kwh(5.25), 1916.2);
        assert_eq!(annual_kwh(0.25), 91.2);
        assert_eq!(round_to(0.125, 2), 0.12);
    }

    #[test]
    fn test_estimate_yield_manual_panel() {
        let sun = SolarAngles { elevation_deg: 45.0, azimuth_deg: 170.0 };
        let panel = PanelConfig::resolve(1.0, TrackingMode::Manual, 15.0, 180.0, sun);
        let env = EnvironmentReading::new(20.0, 60.0);
        let est = estimate_yield(&panel, sun, &env, 0.7);

        // 5.5 × 0.5 × 0.8 × 0.98 = 2.156
        assert_eq!(est.daily_kwh, 2.16);
        assert_eq!(est.annual_kwh, 788.4);
        assert_eq!(est.co2_tonnes_per_year, 0.55);
    }

    #[test]
    fn test_auto_tracking_has_no_tilt_loss() {
        let sun = SolarAngles { elevation_deg: 12.5, azimuth_deg: 95.0 };
        let panel = PanelConfig::resolve(1.0, TrackingMode::Auto, 30.0, 180.0, sun);
        assert_eq!(panel.target_tilt_deg, 12.5);
        assert_eq!(panel.target_azimuth_deg, 95.0);
        let env = EnvironmentReading::new(0.0, 50.0);
        assert_eq!(predict_daily_kwh(&panel, sun, &env), 5.5);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(predict_kwh_default(f64::NAN, 30.0, 30.0, 0.0, 50.0).is_nan());
    }
}
