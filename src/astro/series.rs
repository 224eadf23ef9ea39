//! Hourly elevation sampler.
//!
//! Walks the 24 local hours of a date and evaluates a body's altitude
//! function at each, producing a local-timestamp to degrees mapping. The body
//! is a plain function value, so the same sampler serves the solar and lunar
//! models.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::{ElevationSeries, Observer};

/// Sample a body's altitude at each local hour of `date`.
///
/// Hours that do not exist locally (DST gaps) and samples for which the
/// altitude function fails are skipped with a debug log, so the result may
/// hold fewer than 24 entries. Values are rounded to 4 decimal places.
/// Within a single day the hour is the first varying character of each key,
/// so sorted map order is the required hour-ascending order.
pub fn hourly_series<F>(observer: &Observer, tz: Tz, date: NaiveDate, altitude_fn: F) -> ElevationSeries
where
    F: Fn(&Observer, DateTime<Utc>) -> Option<f64>,
{
    let mut series = ElevationSeries::new();
    for hour in 0..24u32 {
        let Some(naive) = date.and_hms_opt(hour, 0, 0) else {
            continue;
        };
        let Some(local) = tz.from_local_datetime(&naive).earliest() else {
            log::debug!("skipping nonexistent local hour {hour:02}:00 on {date} in {tz}");
            continue;
        };
        match altitude_fn(observer, local.with_timezone(&Utc)) {
            Some(value) if value.is_finite() => {
                series.insert(
                    local.to_rfc3339_opts(SecondsFormat::Secs, false),
                    round4(value),
                );
            }
            _ => log::debug!("elevation sample failed at {local}"),
        }
    }
    series
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
