//! End-to-end scenarios through the public engine API.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use almanac::engine::AstroEngine;
use almanac::models::{AstroQuery, AstroResponse};
use almanac::timezone::LongitudeResolver;

fn engine() -> AstroEngine {
    AstroEngine::new(Arc::new(LongitudeResolver))
}

fn query(lat: f64, lon: f64, tz: &str, date: (i32, u32, u32)) -> AstroQuery {
    AstroQuery {
        lat,
        lon,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        tz_override: Some(tz.to_string()),
        elevation_m: 0.0,
    }
}

fn noon_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn run(q: AstroQuery, now: DateTime<Utc>) -> AstroResponse {
    engine().astro_at(q, now).unwrap()
}

#[test]
fn day_length_matches_the_event_pair() {
    let cases = [
        (51.5074, -0.1278, "Europe/London", (2024, 6, 21)),
        (51.5074, -0.1278, "Europe/London", (2024, 12, 21)),
        (-33.8688, 151.2093, "Australia/Sydney", (2024, 6, 21)),
        (1.3521, 103.8198, "Asia/Singapore", (2024, 3, 20)),
    ];
    for (lat, lon, tz, date) in cases {
        let response = run(query(lat, lon, tz, date), noon_utc(date.0, date.1, date.2));
        let sun = &response.sun;
        let sunrise = sun.sunrise.expect("sunrise");
        let sunset = sun.sunset.expect("sunset");
        let day_length = sun.day_length_seconds.expect("day length");
        assert_eq!(day_length, (sunset - sunrise).num_seconds(), "{tz} {date:?}");
        assert!(day_length > 0);
    }
}

#[test]
fn twilight_tiers_bracket_the_horizon_crossing() {
    // Consistency: for the same morning, the deeper the threshold the
    // earlier the crossing: astronomical < nautical < civil < sunrise.
    let response = run(
        query(48.8566, 2.3522, "Europe/Paris", (2024, 3, 20)),
        noon_utc(2024, 3, 20),
    );
    let sun = &response.sun;
    let astronomical = sun.astronomical_dawn.unwrap();
    let nautical = sun.nautical_dawn.unwrap();
    let civil = sun.civil_dawn.unwrap();
    let sunrise = sun.sunrise.unwrap();
    assert!(astronomical < nautical);
    assert!(nautical < civil);
    assert!(civil < sunrise);

    let sunset = sun.sunset.unwrap();
    let civil_dusk = sun.civil_dusk.unwrap();
    let nautical_dusk = sun.nautical_dusk.unwrap();
    let astronomical_dusk = sun.astronomical_dusk.unwrap();
    assert!(sunset < civil_dusk);
    assert!(civil_dusk < nautical_dusk);
    assert!(nautical_dusk < astronomical_dusk);
}

#[test]
fn arctic_summer_has_daylight_but_no_events() {
    let response = run(
        query(78.0, 15.0, "Arctic/Longyearbyen", (2024, 6, 21)),
        noon_utc(2024, 6, 21),
    );
    let sun = &response.sun;
    assert!(sun.sunrise.is_none());
    assert!(sun.sunset.is_none());
    assert!(sun.is_daylight_now.is_none());
    assert!(sun.dawn.is_none());
    assert!(sun.nautical_dawn.is_none());
    assert!(sun.astronomical_dusk.is_none());
    assert!(sun.blue_hour_morning.is_none());
    assert!(sun.blue_hour_evening.is_none());
    assert!(sun.golden_hour_morning.is_none());
    assert!(sun.golden_hour_evening.is_none());
    // The sun is continuously up: every hourly sample is above the horizon.
    let series = sun.solar_elevation_series.as_ref().unwrap();
    assert!(series.values().all(|alt| *alt > 0.0));
    // Solar noon is still well defined.
    assert!(sun.solar_noon.is_some());
}

#[test]
fn photography_windows_exist_on_an_ordinary_day() {
    let response = run(
        query(51.5074, -0.1278, "Europe/London", (2024, 9, 23)),
        noon_utc(2024, 9, 23),
    );
    let sun = &response.sun;
    for period in [
        sun.blue_hour_morning.as_ref(),
        sun.blue_hour_evening.as_ref(),
        sun.golden_hour_morning.as_ref(),
        sun.golden_hour_evening.as_ref(),
    ] {
        let period = period.expect("window present at mid-latitude equinox");
        assert!(period.start.unwrap() < period.end.unwrap());
    }
}

#[test]
fn moon_data_is_complete_and_self_consistent() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let response = run(
        query(51.5074, -0.1278, "Europe/London", (2024, 1, 1)),
        noon_utc(2024, 1, 1),
    );
    let moon = &response.moon;

    assert!(moon.phase_day_0_29 <= 29);
    assert!(!moon.phase_name.is_empty());
    assert!((0.0..=1.0).contains(&moon.illumination_fraction_est));

    let next_full = moon.next_full_moon.unwrap();
    assert!(next_full > date);
    assert!(next_full - date <= chrono::Duration::days(30));

    let next_new = moon.next_new_moon.unwrap();
    assert!(next_new > date);
    assert!(next_new - date <= chrono::Duration::days(60));
}

#[test]
fn elevation_series_are_deterministic() {
    let q = query(35.6762, 139.6503, "Asia/Tokyo", (2024, 4, 10));
    let now = noon_utc(2024, 4, 10);
    let first = run(q.clone(), now);
    let second = run(q, now);
    assert_eq!(
        first.sun.solar_elevation_series,
        second.sun.solar_elevation_series
    );
    assert_eq!(first.moon.elevation_series, second.moon.elevation_series);
}

#[test]
fn series_timestamps_are_local_hours_of_the_requested_date() {
    let response = run(
        query(35.6762, 139.6503, "Asia/Tokyo", (2024, 4, 10)),
        noon_utc(2024, 4, 10),
    );
    let series = response.sun.solar_elevation_series.unwrap();
    assert_eq!(series.len(), 24);
    for (hour, key) in series.keys().enumerate() {
        assert!(
            key.starts_with(&format!("2024-04-10T{hour:02}:00:00")),
            "hour {hour}: {key}"
        );
        assert!(key.ends_with("+09:00"), "{key}");
    }
}

#[test]
fn response_serializes_to_the_wire_shape() {
    let response = run(
        query(51.5074, -0.1278, "Europe/London", (2024, 6, 21)),
        noon_utc(2024, 6, 21),
    );
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["timezone"], "Europe/London");
    assert_eq!(json["query"]["lat"], 51.5074);
    assert_eq!(json["sun"]["date"], "2024-06-21");
    assert!(json["sun"]["sunrise"].is_string());
    assert!(json["sun"]["astronomical_dawn"].is_null());
    assert!(json["sun"]["solar_elevation_series"].is_object());
    assert!(json["moon"]["phase_day_0_29"].is_number());
    assert!(json["moon"]["next_full_moon"].is_string());
    assert!(json["profiling_ms"].is_null());

    // Timestamps carry the local offset (BST in June).
    let sunrise = json["sun"]["sunrise"].as_str().unwrap();
    assert!(sunrise.ends_with("+01:00"), "{sunrise}");
}

#[test]
fn profiled_run_reports_every_major_stage() {
    let response = AstroEngine::new(Arc::new(LongitudeResolver))
        .with_profiling(true)
        .astro_at(
            query(51.5074, -0.1278, "Europe/London", (2024, 6, 21)),
            noon_utc(2024, 6, 21),
        )
        .unwrap();
    let stages = response.profiling_ms.unwrap();
    for key in [
        "sun.civil_ms",
        "sun.nautical_ms",
        "sun.astronomical_ms",
        "sun.twilight_windows_ms",
        "sun.elevation_series_ms",
        "sun.total_ms",
        "moon.phase_ms",
        "moon.elevation_series_ms",
        "moon.phase_search_ms",
        "moon.total_ms",
        "total_request_ms",
    ] {
        assert!(stages.contains_key(key), "missing stage {key}");
    }
}
