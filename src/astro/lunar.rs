//! Lunar position and phase model.
//!
//! Position uses the leading periodic terms of the Meeus Ch. 47 lunar theory
//! (~0.3° class accuracy, adequate for an hourly elevation plot). Phase is a
//! synodic-epoch calculation: days since a reference new moon, modulo the
//! mean synodic month. The illumination fraction is a smooth cosine heuristic
//! of the phase day, not photometric phase; it is deliberately left that way.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::f64::consts::PI;

use crate::astro::solar::{corrected_obliquity, julian_century, julian_day, wrap_degrees};
use crate::models::Observer;

const DEG: f64 = PI / 180.0;

/// Mean synodic month, days.
pub const SYNODIC_MONTH: f64 = 29.53059;

/// Reference new moon: 2000-01-06 18:14 UTC.
const NEW_MOON_EPOCH_JD: f64 = 2_451_550.26;

/// Phase day of a new moon.
pub const NEW_MOON: u8 = 0;
/// Phase day of a full moon.
pub const FULL_MOON: u8 = 14;

/// Lookahead bound for the next-phase search; two synodic months, so every
/// phase day occurs at least once inside the window.
pub const PHASE_SEARCH_WINDOW_DAYS: u32 = 60;

/// Days since the last new moon at 00:00 UTC of `date`, in [0, 29.53059).
pub fn phase(date: NaiveDate) -> f64 {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    (julian_day(midnight) - NEW_MOON_EPOCH_JD).rem_euclid(SYNODIC_MONTH)
}

/// Phase rounded to the nearest whole day of the cycle, in 0..=29.
pub fn phase_day(date: NaiveDate) -> u8 {
    (phase(date).round() as i64).rem_euclid(30) as u8
}

/// Conventional name for a phase day. The boundaries are a convention, not
/// physically exact; there is no single canonical mapping.
pub fn phase_name(phase_day: u8) -> &'static str {
    match phase_day % 30 {
        0 => "New Moon",
        1..=6 => "Waxing Crescent",
        7 => "First Quarter",
        8..=13 => "Waxing Gibbous",
        14 => "Full Moon",
        15..=20 => "Waning Gibbous",
        21 => "Last Quarter",
        _ => "Waning Crescent", // 22-29
    }
}

/// Illuminated-fraction estimate for a phase day, in [0, 1].
///
/// The phase day is mapped onto one cosine cycle: (1 - cos θ) / 2. This is
/// not precise astronomy, but close enough for a dashboard.
pub fn illumination(phase_day: u8) -> f64 {
    let theta = f64::from(phase_day % 30) * (2.0 * PI / SYNODIC_MONTH);
    ((1.0 - theta.cos()) / 2.0).clamp(0.0, 1.0)
}

/// First date strictly after `from` whose phase day equals `target_phase_day`.
///
/// Steps one day at a time up to `max_days`. If the window is exhausted
/// (cannot happen with the default two-month window), the result is estimated
/// from the current phase, wrapping a zero offset to a full cycle so the
/// returned date is still strictly after `from`. Pure and deterministic.
pub fn next_phase_date(from: NaiveDate, target_phase_day: u8, max_days: u32) -> NaiveDate {
    let target = target_phase_day % 30;
    for step in 1..=i64::from(max_days) {
        let candidate = from + Duration::days(step);
        if phase_day(candidate) == target {
            return candidate;
        }
    }
    let mut offset = (i64::from(target) - i64::from(phase_day(from))).rem_euclid(30);
    if offset == 0 {
        offset = 30;
    }
    from + Duration::days(offset)
}

// Leading periodic terms from the Meeus Ch. 47 lunar theory. Arguments are
// integer multiples of (D, M, M', F); coefficients are in 1e-6 degrees for
// longitude, 1e-3 km for distance, 1e-6 degrees for latitude.
const LONGITUDE_DISTANCE_TERMS: [(i32, i32, i32, i32, f64, f64); 12] = [
    (0, 0, 1, 0, 6_288_774.0, -20_905_355.0),
    (2, 0, -1, 0, 1_274_027.0, -3_699_111.0),
    (2, 0, 0, 0, 658_314.0, -2_955_968.0),
    (0, 0, 2, 0, 213_618.0, -569_925.0),
    (0, 1, 0, 0, -185_116.0, 48_888.0),
    (0, 0, 0, 2, -114_332.0, -3_149.0),
    (2, 0, -2, 0, 58_793.0, 246_158.0),
    (2, -1, -1, 0, 57_066.0, -152_138.0),
    (2, 0, 1, 0, 53_322.0, -170_733.0),
    (2, -1, 0, 0, 45_758.0, -204_586.0),
    (0, 1, -1, 0, -40_923.0, -129_620.0),
    (1, 0, 0, 0, -34_720.0, 108_743.0),
];

const LATITUDE_TERMS: [(i32, i32, i32, i32, f64); 8] = [
    (0, 0, 0, 1, 5_128_122.0),
    (0, 0, 1, 1, 280_602.0),
    (0, 0, 1, -1, 277_693.0),
    (2, 0, 0, -1, 173_237.0),
    (2, 0, -1, 1, 55_413.0),
    (2, 0, -1, -1, 46_271.0),
    (2, 0, 0, 1, 32_573.0),
    (0, 0, 2, 1, 17_198.0),
];

/// Mean elements of the lunar orbit for a Julian century `t`:
/// (L', D, M, M', F), all in degrees.
fn mean_elements(t: f64) -> (f64, f64, f64, f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let lp = wrap_degrees(
        218.3164477 + 481_267.88123421 * t - 0.0015786 * t2 + t3 / 538_841.0 - t4 / 65_194_000.0,
    );
    let d = wrap_degrees(
        297.8501921 + 445_267.1114034 * t - 0.0018819 * t2 + t3 / 545_868.0 - t4 / 113_065_000.0,
    );
    let m = wrap_degrees(357.5291092 + 35_999.0502909 * t - 0.0001536 * t2 + t3 / 24_490_000.0);
    let mp = wrap_degrees(
        134.9633964 + 477_198.8675055 * t + 0.0087414 * t2 + t3 / 69_699.0 - t4 / 14_712_000.0,
    );
    let f = wrap_degrees(
        93.2720950 + 483_202.0175233 * t - 0.0036539 * t2 - t3 / 3_526_000.0
            + t4 / 863_310_000.0,
    );
    (lp, d, m, mp, f)
}

/// Ecliptic longitude (degrees), latitude (degrees), and distance (km) of the
/// moon's center for a Julian century `t`.
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let (lp, d, m, mp, f) = mean_elements(t);

    // Eccentricity decay factor applied to terms involving the sun's anomaly.
    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;

    let mut lon_sum = 0.0;
    let mut dist_sum = 0.0;
    for &(kd, km, kmp, kf, sl, sr) in &LONGITUDE_DISTANCE_TERMS {
        let arg =
            (f64::from(kd) * d + f64::from(km) * m + f64::from(kmp) * mp + f64::from(kf) * f)
                * DEG;
        let scale = match km.abs() {
            1 => e,
            2 => e * e,
            _ => 1.0,
        };
        lon_sum += sl * scale * arg.sin();
        dist_sum += sr * scale * arg.cos();
    }

    let mut lat_sum = 0.0;
    for &(kd, km, kmp, kf, sb) in &LATITUDE_TERMS {
        let arg =
            (f64::from(kd) * d + f64::from(km) * m + f64::from(kmp) * mp + f64::from(kf) * f)
                * DEG;
        let scale = match km.abs() {
            1 => e,
            2 => e * e,
            _ => 1.0,
        };
        lat_sum += sb * scale * arg.sin();
    }

    // Largest additive corrections: the Venus term and the flattening term.
    let a1 = wrap_degrees(119.75 + 131.849 * t);
    let a3 = wrap_degrees(313.45 + 481_266.484 * t);
    lon_sum += 3958.0 * (a1 * DEG).sin() + 1962.0 * ((lp - f) * DEG).sin();
    lat_sum += -2235.0 * (lp * DEG).sin() + 382.0 * (a3 * DEG).sin();

    let longitude = wrap_degrees(lp + lon_sum / 1e6);
    let latitude = lat_sum / 1e6;
    let distance = 385_000.56 + dist_sum / 1000.0;
    (longitude, latitude, distance)
}

/// Greenwich mean sidereal time in degrees.
fn greenwich_sidereal_deg(jd: f64) -> f64 {
    let t = julian_century(jd);
    wrap_degrees(
        280.46061837 + 360.98564736629 * (jd - 2_451_545.0) + 0.000387933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Geometric (refraction-free) lunar altitude in degrees for an observer at a
/// UTC instant, including the topocentric parallax correction, which pulls
/// the moon down by up to ~1°.
pub fn altitude(observer: &Observer, instant: DateTime<Utc>) -> f64 {
    let jd = julian_day(instant);
    let t = julian_century(jd);

    let (lon, lat, distance) = moon_ecliptic(t);
    let obliquity = corrected_obliquity(t) * DEG;
    let lon_r = lon * DEG;
    let lat_r = lat * DEG;

    // Ecliptic to equatorial.
    let ra = (lon_r.sin() * obliquity.cos() - lat_r.tan() * obliquity.sin()).atan2(lon_r.cos());
    let decl =
        (lat_r.sin() * obliquity.cos() + lat_r.cos() * obliquity.sin() * lon_r.sin()).asin();

    // Equatorial to horizontal via the local hour angle.
    let lst = (greenwich_sidereal_deg(jd) + observer.longitude) * DEG;
    let hour_angle = lst - ra;
    let phi = observer.latitude * DEG;
    let sin_alt = phi.sin() * decl.sin() + phi.cos() * decl.cos() * hour_angle.cos();
    let geocentric = sin_alt.clamp(-1.0, 1.0).asin() / DEG;

    let parallax = (6378.14 / distance).asin() / DEG;
    geocentric - parallax * (geocentric * DEG).cos()
}
