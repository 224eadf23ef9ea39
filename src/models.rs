//! Request and response types for the almanac engine.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Chronologically ordered mapping of local RFC 3339 timestamps to altitude
/// degrees.
pub type ElevationSeries = BTreeMap<String, f64>;

/// Observer location on the Earth's surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observer {
    /// Latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Elevation above sea level in meters.
    #[serde(default)]
    pub elevation: f64,
}

impl Observer {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

/// Start/end pair for a twilight window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

impl TimePeriod {
    /// A window needs both endpoints; a half-open window is represented as
    /// fully absent instead.
    pub fn from_bounds(
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self {
                start: Some(start),
                end: Some(end),
            }),
            _ => None,
        }
    }
}

/// Sun event times for one location and date. Every event is optional:
/// at high latitudes a crossing may simply not occur on a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunTimes {
    pub timezone: String,
    pub date: NaiveDate,
    pub dawn: Option<DateTime<FixedOffset>>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub solar_noon: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub dusk: Option<DateTime<FixedOffset>>,
    pub day_length_seconds: Option<i64>,
    pub is_daylight_now: Option<bool>,
    pub civil_dawn: Option<DateTime<FixedOffset>>,
    pub civil_dusk: Option<DateTime<FixedOffset>>,
    pub nautical_dawn: Option<DateTime<FixedOffset>>,
    pub nautical_dusk: Option<DateTime<FixedOffset>>,
    pub astronomical_dawn: Option<DateTime<FixedOffset>>,
    pub astronomical_dusk: Option<DateTime<FixedOffset>>,
    pub blue_hour_morning: Option<TimePeriod>,
    pub blue_hour_evening: Option<TimePeriod>,
    pub golden_hour_morning: Option<TimePeriod>,
    pub golden_hour_evening: Option<TimePeriod>,
    pub solar_elevation_series: Option<ElevationSeries>,
}

impl SunTimes {
    /// A result carrying only the request identity; the degraded shape the
    /// sun path falls back to when the solve cannot proceed.
    pub fn empty(timezone: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            timezone: timezone.into(),
            date,
            dawn: None,
            sunrise: None,
            solar_noon: None,
            sunset: None,
            dusk: None,
            day_length_seconds: None,
            is_daylight_now: None,
            civil_dawn: None,
            civil_dusk: None,
            nautical_dawn: None,
            nautical_dusk: None,
            astronomical_dawn: None,
            astronomical_dusk: None,
            blue_hour_morning: None,
            blue_hour_evening: None,
            golden_hour_morning: None,
            golden_hour_evening: None,
            solar_elevation_series: None,
        }
    }
}

/// Moon phase and position data for one location and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoonInfo {
    /// Whole day of the synodic cycle, 0 = new moon, 14 ≈ full moon.
    pub phase_day_0_29: u8,
    pub phase_name: String,
    /// Heuristic estimate, 0.0..=1.0; not photometric phase.
    pub illumination_fraction_est: f64,
    pub elevation_series: Option<ElevationSeries>,
    pub next_new_moon: Option<NaiveDate>,
    pub next_full_moon: Option<NaiveDate>,
}

/// One almanac request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstroQuery {
    pub lat: f64,
    pub lon: f64,
    /// Defaults to "today" in the resolved timezone.
    pub date: Option<NaiveDate>,
    /// IANA timezone to force (e.g. "Europe/London") instead of resolving
    /// one from the coordinates.
    pub tz_override: Option<String>,
    #[serde(default)]
    pub elevation_m: f64,
}

/// The composed almanac response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstroResponse {
    pub query: AstroQuery,
    pub timezone: String,
    pub now_local: DateTime<FixedOffset>,
    pub sun: SunTimes,
    pub moon: MoonInfo,
    /// Per-stage wall-clock durations, present when profiling is enabled.
    pub profiling_ms: Option<BTreeMap<String, f64>>,
}

/// One entry of the service link list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub name: String,
    pub url: String,
    pub group: Option<String>,
    pub icon: Option<String>,
}
