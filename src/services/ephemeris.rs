/// ============================================================
///  Low-order Solar Ephemeris
///
///  Algorithm pipeline:
///   1. Julian Day       – civil UTC date → continuous day count
///   2. Mean elements    – mean longitude L, mean anomaly g
///   3. Ecliptic coords  – two-term equation of centre, obliquity
///   4. Equatorial coords – right ascension α, declination δ
///   5. Sidereal time    – GMST → LST → hour angle H
///   6. Horizontal coords – elevation, azimuth (N=0°, clockwise)
///
///  Accuracy is a few tenths of a degree around the present era.
///  No refraction correction is applied.
/// ============================================================

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::models::solar::{GeoPosition, SolarAngles};

// ─── Constants ───────────────────────────────────────────────
const J2000: f64 = 2451545.0;

/// Euclidean modulo for angles; never returns a negative value.
#[inline]
pub fn normalize_deg(angle: f64) -> f64 {
    let r = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

/// Julian Day for a UTC instant (Meeus, Gregorian calendar).
pub fn julian_day(t: DateTime<Utc>) -> f64 {
    let mut y = t.year() as f64;
    let mut m = t.month() as f64;
    let d = t.day() as f64;
    let hours = t.hour() as f64
        + t.minute() as f64 / 60.0
        + (t.second() as f64 + t.nanosecond() as f64 * 1e-9) / 3600.0;

    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y + 4716.0)).trunc() + (30.6001 * (m + 1.0)).trunc() + d + b - 1524.5 + hours / 24.0
}

/// Main entry point – sun elevation/azimuth for an observer at `instant`.
pub fn compute_solar_angles(position: GeoPosition, instant: DateTime<Utc>) -> SolarAngles {
    let n = julian_day(instant) - J2000;

    // ── Mean elements ─────────────────────────────────────────
    let l = normalize_deg(280.460 + 0.9856474 * n);
    let g = normalize_deg(357.528 + 0.9856003 * n).to_radians();

    // ── Ecliptic longitude & obliquity ────────────────────────
    let lambda = (l + 1.915 * g.sin() + 0.020 * (2.0 * g).sin()).to_radians();
    let eps = (23.439 - 0.0000004 * n).to_radians();

    // ── Right ascension / declination ─────────────────────────
    let alpha_deg = (eps.cos() * lambda.sin()).atan2(lambda.cos()).to_degrees();
    let decl = asin_clamped(eps.sin() * lambda.sin());

    // ── Sidereal time & hour angle ────────────────────────────
    let gmst = normalize_deg(280.46061837 + 360.98564736629 * n);
    let lst = normalize_deg(gmst + position.longitude);
    let h = (normalize_deg(lst - alpha_deg + 540.0) - 180.0).to_radians();

    // ── Horizontal coordinates ────────────────────────────────
    let lat = position.latitude.to_radians();
    let sin_el = lat.sin() * decl.sin() + lat.cos() * decl.cos() * h.cos();
    let elevation_deg = asin_clamped(sin_el).to_degrees();

    let y = -h.sin() * decl.cos();
    let x = lat.cos() * decl.sin() - lat.sin() * decl.cos() * h.cos();
    let azimuth_deg = normalize_deg(y.atan2(x).to_degrees());

    #[cfg(feature = "verbose_log")]
    tracing::debug!(
        "[EPHEMERIS] n={:.5} α={:.3}° δ={:.3}° H={:.3}° → el={:.3}° az={:.3}°",
        n, alpha_deg, decl.to_degrees(), h.to_degrees(), elevation_deg, azimuth_deg
    );

    SolarAngles { elevation_deg, azimuth_deg }
}

/// Tuple form: `(elevation_deg, azimuth_deg)`.
#[allow(dead_code)]
pub fn solar_position(lat_deg: f64, lon_deg: f64, instant: DateTime<Utc>) -> (f64, f64) {
    let a = compute_solar_angles(GeoPosition::new(lat_deg, lon_deg), instant);
    (a.elevation_deg, a.azimuth_deg)
}

// Rounding can push |x| a hair above 1 near the zenith; NaN stays NaN.
#[inline]
fn asin_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}
