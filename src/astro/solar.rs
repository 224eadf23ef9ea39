//! Solar position model.
//!
//! Low-precision solar theory in the NOAA style: mean longitude and anomaly,
//! equation of center, apparent longitude, corrected obliquity. Accuracy is on
//! the order of 0.01° within a few decades of J2000, which is plenty for civil
//! dashboard events. Altitudes are geometric (no atmospheric refraction).

use chrono::{DateTime, Utc};
use std::f64::consts::PI;

use crate::models::Observer;

const DEG: f64 = PI / 180.0;

/// Convert a UTC instant to a Julian Date.
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

/// Julian centuries since J2000.0.
pub(crate) fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

pub(crate) fn wrap_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Per-instant solar quantities shared by the altitude function and the
/// event solver's transit estimate.
#[derive(Debug, Clone, Copy)]
pub struct SunGeometry {
    /// Apparent declination, degrees.
    pub declination: f64,
    /// Equation of time, minutes of time.
    pub equation_of_time: f64,
}

impl SunGeometry {
    pub fn at(instant: DateTime<Utc>) -> Self {
        let t = julian_century(julian_day(instant));

        let mean_longitude = wrap_degrees(280.46646 + t * (36000.76983 + t * 0.0003032));
        let mean_anomaly = wrap_degrees(357.52911 + t * (35999.05029 - t * 0.0001537));
        let eccentricity = 0.016708634 - t * (0.000042037 + t * 0.0000001267);

        let m = mean_anomaly * DEG;
        let equation_of_center = m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
            + (2.0 * m).sin() * (0.019993 - t * 0.000101)
            + (3.0 * m).sin() * 0.000289;

        // Apparent longitude includes the nutation/aberration correction tied
        // to the lunar ascending node.
        let node = 125.04 - 1934.136 * t;
        let true_longitude = mean_longitude + equation_of_center;
        let apparent_longitude = true_longitude - 0.00569 - 0.00478 * (node * DEG).sin();

        let obliquity = corrected_obliquity(t);

        let declination =
            ((obliquity * DEG).sin() * (apparent_longitude * DEG).sin()).asin() / DEG;

        let y = (obliquity * DEG / 2.0).tan().powi(2);
        let l0 = mean_longitude * DEG;
        let eq = y * (2.0 * l0).sin() - 2.0 * eccentricity * m.sin()
            + 4.0 * eccentricity * y * m.sin() * (2.0 * l0).cos()
            - 0.5 * y * y * (4.0 * l0).sin()
            - 1.25 * eccentricity * eccentricity * (2.0 * m).sin();
        let equation_of_time = 4.0 * eq / DEG;

        Self {
            declination,
            equation_of_time,
        }
    }
}

/// Mean obliquity of the ecliptic plus the periodic correction, degrees.
pub(crate) fn corrected_obliquity(t: f64) -> f64 {
    let mean =
        23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let node = 125.04 - 1934.136 * t;
    mean + 0.00256 * (node * DEG).cos()
}

/// Geometric solar altitude in degrees for an observer at a UTC instant.
///
/// Total for any finite input: polar latitudes and midnight-sun dates return
/// a plain (possibly strongly negative or positive) altitude, never an error.
pub fn altitude(observer: &Observer, instant: DateTime<Utc>) -> f64 {
    let geometry = SunGeometry::at(instant);

    let utc_minutes = instant.timestamp_millis().rem_euclid(86_400_000) as f64 / 60_000.0;
    let solar_minutes = utc_minutes + geometry.equation_of_time + 4.0 * observer.longitude;
    let hour_angle = solar_minutes / 4.0 - 180.0;

    let lat = observer.latitude * DEG;
    let decl = geometry.declination * DEG;
    let ha = hour_angle * DEG;

    let sin_alt = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos();
    sin_alt.clamp(-1.0, 1.0).asin() / DEG
}
