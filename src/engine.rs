//! Request orchestration.
//!
//! Composes the position models, the twilight solver, the elevation sampler,
//! and the phase search into one response per request. The sun path degrades
//! to absent values and never fails a request; timezone resolution and the
//! moon path are the only stages allowed to.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::astro::events::{DayCurve, Edge, Twilight};
use crate::astro::series::{hourly_series, round4};
use crate::astro::{lunar, solar};
use crate::metrics::Profiler;
use crate::models::{AstroQuery, AstroResponse, MoonInfo, Observer, SunTimes};
use crate::timezone::TimezoneResolver;

/// Engine failures, classified by fault: `is_client_fault` distinguishes bad
/// input from internal errors for the transport layer's status mapping.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
    #[error("elevation {0} m is outside -430..=9000")]
    ElevationOutOfRange(f64),
    #[error("invalid date {input:?}: {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
    #[error("timezone resolution failed: {0}")]
    TimezoneResolution(String),
    #[error("moon calculation failed: {0}")]
    MoonComputation(String),
}

impl EngineError {
    pub fn is_client_fault(&self) -> bool {
        !matches!(
            self,
            Self::TimezoneResolution(_) | Self::MoonComputation(_)
        )
    }
}

/// Parse an ISO `YYYY-MM-DD` date string.
pub fn parse_date(input: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|source| EngineError::InvalidDate {
        input: input.to_string(),
        source,
    })
}

/// The almanac engine: stateless per request, sharing only the read-only
/// timezone resolver constructed at startup.
pub struct AstroEngine {
    resolver: Arc<dyn TimezoneResolver>,
    profiling: bool,
}

impl AstroEngine {
    pub fn new(resolver: Arc<dyn TimezoneResolver>) -> Self {
        Self {
            resolver,
            profiling: false,
        }
    }

    /// Attach per-stage wall-clock timing to responses.
    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    /// Compute the almanac for a query, with "now" taken from the wall clock.
    pub fn astro(&self, query: AstroQuery) -> Result<AstroResponse, EngineError> {
        self.astro_at(query, Utc::now())
    }

    /// Compute the almanac for a query at an explicit "now" instant. Every
    /// result is a pure function of `(query, now)`.
    pub fn astro_at(
        &self,
        query: AstroQuery,
        now: DateTime<Utc>,
    ) -> Result<AstroResponse, EngineError> {
        validate(&query)?;

        let mut profiler = Profiler::new(self.profiling);
        let request_start = Instant::now();

        let tz_name = match &query.tz_override {
            Some(name) => name.clone(),
            None => {
                let started = Instant::now();
                let name = self
                    .resolver
                    .resolve(query.lat, query.lon)
                    .map_err(|err| EngineError::TimezoneResolution(format!("{err:#}")))?;
                profiler.record("resolve_timezone_ms", started);
                name
            }
        };
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| EngineError::UnknownTimezone(tz_name.clone()))?;

        let on_date = query
            .date
            .unwrap_or_else(|| now.with_timezone(&tz).date_naive());
        let observer = Observer::new(query.lat, query.lon, query.elevation_m);

        let sun = self.compute_sun_times(&observer, on_date, tz, &tz_name, now, &mut profiler);
        let moon = self.compute_moon(&observer, on_date, tz, &mut profiler)?;
        let now_local = now.with_timezone(&tz).fixed_offset();

        profiler.record("total_request_ms", request_start);

        Ok(AstroResponse {
            query,
            timezone: tz_name,
            now_local,
            sun,
            moon,
            profiling_ms: profiler.into_stages(),
        })
    }

    /// Sun events, photography windows, and the hourly solar series.
    ///
    /// Never fails: each event is already an optional, and when the local day
    /// itself cannot be constructed the result carries only date + timezone.
    fn compute_sun_times(
        &self,
        observer: &Observer,
        date: NaiveDate,
        tz: Tz,
        tz_name: &str,
        now: DateTime<Utc>,
        profiler: &mut Profiler,
    ) -> SunTimes {
        let overall = Instant::now();
        let mut sun = SunTimes::empty(tz_name, date);

        let Some(curve) = DayCurve::build(observer, date, tz) else {
            log::warn!("sun computation degraded: no local day for {date} in {tz}");
            profiler.record("sun.total_ms", overall);
            return sun;
        };

        let started = Instant::now();
        let civil = curve.events(Twilight::Civil);
        profiler.record("sun.civil_ms", started);
        let started = Instant::now();
        let nautical = curve.events(Twilight::Nautical);
        profiler.record("sun.nautical_ms", started);
        let started = Instant::now();
        let astronomical = curve.events(Twilight::Astronomical);
        profiler.record("sun.astronomical_ms", started);

        sun.dawn = civil.dawn.map(|t| t.fixed_offset());
        sun.sunrise = civil.sunrise.map(|t| t.fixed_offset());
        sun.solar_noon = civil.noon.map(|t| t.fixed_offset());
        sun.sunset = civil.sunset.map(|t| t.fixed_offset());
        sun.dusk = civil.dusk.map(|t| t.fixed_offset());
        sun.civil_dawn = sun.dawn;
        sun.civil_dusk = sun.dusk;
        sun.nautical_dawn = nautical.dawn.map(|t| t.fixed_offset());
        sun.nautical_dusk = nautical.dusk.map(|t| t.fixed_offset());
        sun.astronomical_dawn = astronomical.dawn.map(|t| t.fixed_offset());
        sun.astronomical_dusk = astronomical.dusk.map(|t| t.fixed_offset());

        if let (Some(sunrise), Some(sunset)) = (sun.sunrise, sun.sunset) {
            sun.day_length_seconds = Some((sunset - sunrise).num_seconds()).filter(|s| *s >= 0);
            let now_fixed = now.fixed_offset();
            sun.is_daylight_now = Some(sunrise <= now_fixed && now_fixed <= sunset);
        }

        let started = Instant::now();
        sun.blue_hour_morning = curve.blue_hour(Edge::Rising);
        sun.blue_hour_evening = curve.blue_hour(Edge::Setting);
        sun.golden_hour_morning = curve.golden_hour(Edge::Rising);
        sun.golden_hour_evening = curve.golden_hour(Edge::Setting);
        profiler.record("sun.twilight_windows_ms", started);

        let started = Instant::now();
        let series = hourly_series(observer, tz, date, |obs, instant| {
            Some(solar::altitude(obs, instant))
        });
        profiler.record("sun.elevation_series_ms", started);
        sun.solar_elevation_series = (!series.is_empty()).then_some(series);

        profiler.record("sun.total_ms", overall);
        sun
    }

    /// Moon phase, illumination, hourly series, and next-phase dates. The one
    /// computation allowed to fail the whole request.
    fn compute_moon(
        &self,
        observer: &Observer,
        date: NaiveDate,
        tz: Tz,
        profiler: &mut Profiler,
    ) -> Result<MoonInfo, EngineError> {
        let overall = Instant::now();

        let started = Instant::now();
        let age = lunar::phase(date);
        profiler.record("moon.phase_ms", started);
        if !age.is_finite() {
            return Err(EngineError::MoonComputation(format!(
                "non-finite phase for {date}"
            )));
        }
        let day = lunar::phase_day(date);

        let started = Instant::now();
        let series = hourly_series(observer, tz, date, |obs, instant| {
            Some(lunar::altitude(obs, instant))
        });
        profiler.record("moon.elevation_series_ms", started);

        let started = Instant::now();
        let next_new_moon =
            lunar::next_phase_date(date, lunar::NEW_MOON, lunar::PHASE_SEARCH_WINDOW_DAYS);
        let next_full_moon =
            lunar::next_phase_date(date, lunar::FULL_MOON, lunar::PHASE_SEARCH_WINDOW_DAYS);
        profiler.record("moon.phase_search_ms", started);

        let info = MoonInfo {
            phase_day_0_29: day,
            phase_name: lunar::phase_name(day).to_string(),
            illumination_fraction_est: round4(lunar::illumination(day)),
            elevation_series: (!series.is_empty()).then_some(series),
            next_new_moon: Some(next_new_moon),
            next_full_moon: Some(next_full_moon),
        };
        profiler.record("moon.total_ms", overall);
        Ok(info)
    }
}

fn validate(query: &AstroQuery) -> Result<(), EngineError> {
    if !(-90.0..=90.0).contains(&query.lat) {
        return Err(EngineError::LatitudeOutOfRange(query.lat));
    }
    if !(-180.0..=180.0).contains(&query.lon) {
        return Err(EngineError::LongitudeOutOfRange(query.lon));
    }
    if !(-430.0..=9000.0).contains(&query.elevation_m) {
        return Err(EngineError::ElevationOutOfRange(query.elevation_m));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::{LongitudeResolver, UtcResolver};
    use chrono::TimeZone;

    struct FailingResolver;

    impl TimezoneResolver for FailingResolver {
        fn resolve(&self, _lat: f64, _lon: f64) -> anyhow::Result<String> {
            anyhow::bail!("spatial index offline")
        }
    }

    fn engine() -> AstroEngine {
        AstroEngine::new(Arc::new(LongitudeResolver))
    }

    fn london_query(date: (i32, u32, u32)) -> AstroQuery {
        AstroQuery {
            lat: 51.5074,
            lon: -0.1278,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            tz_override: Some("Europe/London".to_string()),
            elevation_m: 0.0,
        }
    }

    fn noon_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn out_of_range_inputs_are_client_faults() {
        let engine = engine();
        let mut query = london_query((2024, 6, 21));
        query.lat = 91.0;
        let err = engine.astro_at(query, noon_utc(2024, 6, 21)).unwrap_err();
        assert!(matches!(err, EngineError::LatitudeOutOfRange(_)));
        assert!(err.is_client_fault());

        let mut query = london_query((2024, 6, 21));
        query.elevation_m = 12_000.0;
        let err = engine.astro_at(query, noon_utc(2024, 6, 21)).unwrap_err();
        assert!(matches!(err, EngineError::ElevationOutOfRange(_)));
    }

    #[test]
    fn invalid_date_string_is_a_client_fault() {
        let err = parse_date("2024-13-40").unwrap_err();
        assert!(matches!(err, EngineError::InvalidDate { .. }));
        assert!(err.is_client_fault());
        assert_eq!(
            parse_date("2024-06-21").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
        );
    }

    #[test]
    fn unknown_timezone_override_is_a_client_fault() {
        let mut query = london_query((2024, 6, 21));
        query.tz_override = Some("Europe/Atlantis".to_string());
        let err = engine().astro_at(query, noon_utc(2024, 6, 21)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTimezone(_)));
        assert!(err.is_client_fault());
    }

    #[test]
    fn failing_resolver_is_a_server_fault() {
        let engine = AstroEngine::new(Arc::new(FailingResolver));
        let mut query = london_query((2024, 6, 21));
        query.tz_override = None;
        let err = engine.astro_at(query, noon_utc(2024, 6, 21)).unwrap_err();
        assert!(matches!(err, EngineError::TimezoneResolution(_)));
        assert!(!err.is_client_fault());
    }

    #[test]
    fn override_skips_the_resolver_entirely() {
        // A failing resolver is irrelevant when the caller forces a zone.
        let engine = AstroEngine::new(Arc::new(FailingResolver));
        let response = engine
            .astro_at(london_query((2024, 6, 21)), noon_utc(2024, 6, 21))
            .unwrap();
        assert_eq!(response.timezone, "Europe/London");
    }

    #[test]
    fn london_solstice_response_is_complete() {
        let response = engine()
            .astro_at(london_query((2024, 6, 21)), noon_utc(2024, 6, 21))
            .unwrap();

        let sun = &response.sun;
        assert!(sun.sunrise.is_some());
        assert!(sun.sunset.is_some());
        assert!(sun.day_length_seconds.unwrap() > 12 * 3600);
        // Noon UTC is mid-afternoon London time: daylight.
        assert_eq!(sun.is_daylight_now, Some(true));
        assert!(sun.astronomical_dawn.is_none());
        assert_eq!(sun.solar_elevation_series.as_ref().unwrap().len(), 24);
        assert_eq!(sun.civil_dawn, sun.dawn);

        let moon = &response.moon;
        assert!(moon.phase_day_0_29 <= 29);
        assert!((0.0..=1.0).contains(&moon.illumination_fraction_est));
        assert!(moon.next_new_moon.unwrap() > NaiveDate::from_ymd_opt(2024, 6, 21).unwrap());
        assert!(moon.next_full_moon.is_some());
        assert_eq!(moon.elevation_series.as_ref().unwrap().len(), 24);

        assert!(response.profiling_ms.is_none());
    }

    #[test]
    fn night_time_now_reports_no_daylight() {
        let response = engine()
            .astro_at(
                london_query((2024, 6, 21)),
                Utc.with_ymd_and_hms(2024, 6, 21, 23, 30, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(response.sun.is_daylight_now, Some(false));
    }

    #[test]
    fn polar_day_degrades_to_absent_sun_fields() {
        let query = AstroQuery {
            lat: 78.0,
            lon: 15.0,
            date: NaiveDate::from_ymd_opt(2024, 6, 21),
            tz_override: Some("Arctic/Longyearbyen".to_string()),
            elevation_m: 0.0,
        };
        let response = engine().astro_at(query, noon_utc(2024, 6, 21)).unwrap();
        let sun = &response.sun;
        assert!(sun.sunrise.is_none());
        assert!(sun.sunset.is_none());
        assert!(sun.day_length_seconds.is_none());
        assert!(sun.is_daylight_now.is_none());
        assert!(sun.blue_hour_morning.is_none());
        assert!(sun.golden_hour_evening.is_none());
        // The moon path still succeeds and the request does not error.
        assert!(response.moon.phase_day_0_29 <= 29);
    }

    #[test]
    fn profiling_records_stage_labels_without_changing_results() {
        let query = london_query((2024, 6, 21));
        let now = noon_utc(2024, 6, 21);

        let plain = engine().astro_at(query.clone(), now).unwrap();
        let profiled = engine()
            .with_profiling(true)
            .astro_at(query, now)
            .unwrap();

        let stages = profiled.profiling_ms.as_ref().unwrap();
        assert!(stages.contains_key("total_request_ms"));
        assert!(stages.contains_key("sun.total_ms"));
        assert!(stages.contains_key("moon.total_ms"));
        assert!(stages.keys().all(|k| k.ends_with("_ms")));

        assert_eq!(plain.sun.sunrise, profiled.sun.sunrise);
        assert_eq!(plain.moon.phase_day_0_29, profiled.moon.phase_day_0_29);
        assert_eq!(
            plain.sun.solar_elevation_series,
            profiled.sun.solar_elevation_series
        );
    }

    #[test]
    fn date_defaults_to_today_in_the_resolved_zone() {
        // 23:30 UTC on June 21 is already June 22 in Etc/GMT-1 (UTC+1).
        let query = AstroQuery {
            lat: 52.52,
            lon: 13.4,
            date: None,
            tz_override: None,
            elevation_m: 0.0,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 23, 30, 0).unwrap();
        let response = engine().astro_at(query, now).unwrap();
        assert_eq!(response.timezone, "Etc/GMT-1");
        assert_eq!(
            response.sun.date,
            NaiveDate::from_ymd_opt(2024, 6, 22).unwrap()
        );
    }

    #[test]
    fn utc_resolver_round_trip() {
        let engine = AstroEngine::new(Arc::new(UtcResolver));
        let query = AstroQuery {
            lat: 0.0,
            lon: 0.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 20),
            tz_override: None,
            elevation_m: 0.0,
        };
        let response = engine.astro_at(query, noon_utc(2024, 3, 20)).unwrap();
        assert_eq!(response.timezone, "UTC");
        assert_eq!(response.now_local.to_rfc3339(), "2024-03-20T12:00:00+00:00");
    }
}
