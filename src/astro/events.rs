//! Twilight and sun-event solver.
//!
//! Samples the solar altitude across one local calendar day, then refines
//! solar noon (the altitude maximum) by ternary search and each threshold
//! crossing by bisection. A crossing that does not exist on that day (polar
//! day or polar night at the given depression) is an absent value, never an
//! error.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::astro::solar;
use crate::models::{Observer, TimePeriod};

/// Twilight tiers, named by the depression of the sun below the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Twilight {
    /// Sun at -6°; the tier that also carries sunrise/sunset and solar noon.
    Civil,
    /// Sun at -12°.
    Nautical,
    /// Sun at -18°.
    Astronomical,
}

impl Twilight {
    /// Depression angle in degrees below the geometric horizon.
    pub const fn depression(self) -> f64 {
        match self {
            Self::Civil => 6.0,
            Self::Nautical => 12.0,
            Self::Astronomical => 18.0,
        }
    }
}

/// Which side of solar noon a crossing is searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Setting,
}

/// Solar events for one local calendar day at one twilight tier. Sunrise,
/// sunset, and noon are only populated for the civil tier.
#[derive(Debug, Clone, Default)]
pub struct SolarEvents {
    pub dawn: Option<DateTime<Tz>>,
    pub sunrise: Option<DateTime<Tz>>,
    pub noon: Option<DateTime<Tz>>,
    pub sunset: Option<DateTime<Tz>>,
    pub dusk: Option<DateTime<Tz>>,
}

/// Sunrise/sunset threshold: solar radius plus standard refraction.
const SUNRISE_SUNSET_ALTITUDE: f64 = -0.833;

// Altitude bands for the photography windows. Exact bounds vary between
// sources; these are the conventional ones: blue hour while the sun is in
// [-6°, -4°], golden hour in [-4°, +6°].
const BLUE_HOUR_FLOOR: f64 = -6.0;
const GOLDEN_HOUR_FLOOR: f64 = -4.0;
const GOLDEN_HOUR_CEILING: f64 = 6.0;

/// Coarse scan resolution. The sun moves at most ~0.25°/minute in altitude,
/// so a ten-minute grid cannot step over a crossing of interest.
const SCAN_STEP_SECS: i64 = 600;

/// The solar altitude curve over one local calendar day, sampled once and
/// shared by every tier and band solved for that day.
pub struct DayCurve {
    observer: Observer,
    tz: Tz,
    date: NaiveDate,
    start_ts: i64,
    end_ts: i64,
    noon_ts: i64,
    samples: Vec<(i64, f64)>,
}

/// First valid local instant at or after midnight of `date`. Walks forward
/// hour by hour when midnight falls into a DST gap.
fn local_day_start(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    for hour in 0..3 {
        if let Some(t) = date
            .and_hms_opt(hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        {
            return Some(t);
        }
    }
    None
}

impl DayCurve {
    pub fn build(observer: &Observer, date: NaiveDate, tz: Tz) -> Option<Self> {
        let start = local_day_start(date, tz)?;
        let end = local_day_start(date + Duration::days(1), tz)?;

        let mut curve = Self {
            observer: *observer,
            tz,
            date,
            start_ts: start.timestamp(),
            end_ts: end.timestamp(),
            noon_ts: 0,
            samples: Vec::with_capacity(150),
        };
        let mut ts = curve.start_ts;
        while ts <= curve.end_ts {
            curve.samples.push((ts, curve.altitude_at(ts)));
            ts += SCAN_STEP_SECS;
        }
        curve.noon_ts = curve.refine_transit()?;
        Some(curve)
    }

    fn altitude_at(&self, ts: i64) -> f64 {
        match DateTime::from_timestamp(ts, 0) {
            Some(instant) => solar::altitude(&self.observer, instant),
            None => f64::NAN,
        }
    }

    fn instant(&self, ts: i64) -> Option<DateTime<Tz>> {
        DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&self.tz))
    }

    /// Solar noon: the second at which the sampled altitude curve peaks,
    /// narrowed by ternary search around the best coarse sample.
    fn refine_transit(&self) -> Option<i64> {
        let (peak_ts, _) = self
            .samples
            .iter()
            .copied()
            .filter(|(_, alt)| alt.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        let mut lo = (peak_ts - SCAN_STEP_SECS).max(self.start_ts);
        let mut hi = (peak_ts + SCAN_STEP_SECS).min(self.end_ts);
        while hi - lo > 2 {
            let third = (hi - lo) / 3;
            let m1 = lo + third;
            let m2 = hi - third;
            if self.altitude_at(m1) < self.altitude_at(m2) {
                lo = m1;
            } else {
                hi = m2;
            }
        }
        (lo..=hi).max_by(|a, b| self.altitude_at(*a).total_cmp(&self.altitude_at(*b)))
    }

    /// Instant at which the altitude crosses `target` on the given side of
    /// noon, or None when the curve never crosses it that day.
    fn crossing(&self, target: f64, edge: Edge) -> Option<DateTime<Tz>> {
        let (window_lo, window_hi) = match edge {
            Edge::Rising => (self.start_ts, self.noon_ts),
            Edge::Setting => (self.noon_ts, self.end_ts),
        };
        for pair in self.samples.windows(2) {
            let (t0, a0) = pair[0];
            let (t1, a1) = pair[1];
            if t1 <= window_lo || t0 >= window_hi {
                continue;
            }
            if !a0.is_finite() || !a1.is_finite() {
                continue;
            }
            let brackets = match edge {
                Edge::Rising => a0 <= target && a1 > target,
                Edge::Setting => a0 >= target && a1 < target,
            };
            if brackets {
                return self.instant(self.refine_crossing(t0, t1, target, edge));
            }
        }
        None
    }

    /// Bisect a bracketing pair down to one second.
    fn refine_crossing(&self, mut lo: i64, mut hi: i64, target: f64, edge: Edge) -> i64 {
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let alt = self.altitude_at(mid);
            if !alt.is_finite() {
                break;
            }
            let keep_low = match edge {
                Edge::Rising => alt <= target,
                Edge::Setting => alt >= target,
            };
            if keep_low {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    }

    /// Events for a twilight tier. Dawn/dusk are the crossings of the tier's
    /// depression; the civil tier additionally carries sunrise/sunset (with
    /// the horizon lowered by the observer's elevation dip) and solar noon.
    pub fn events(&self, tier: Twilight) -> SolarEvents {
        let depression = tier.depression();
        let mut events = SolarEvents {
            dawn: self.crossing(-depression, Edge::Rising),
            dusk: self.crossing(-depression, Edge::Setting),
            ..SolarEvents::default()
        };
        if tier == Twilight::Civil {
            let horizon = SUNRISE_SUNSET_ALTITUDE - horizon_dip_deg(self.observer.elevation);
            events.sunrise = self.crossing(horizon, Edge::Rising);
            events.sunset = self.crossing(horizon, Edge::Setting);
            events.noon = self.instant(self.noon_ts);
        }
        events
    }

    /// Blue hour: the window with the sun between -6° and -4°.
    pub fn blue_hour(&self, edge: Edge) -> Option<TimePeriod> {
        self.band(BLUE_HOUR_FLOOR, GOLDEN_HOUR_FLOOR, edge, "blue hour")
    }

    /// Golden hour: the window with the sun between -4° and +6°.
    pub fn golden_hour(&self, edge: Edge) -> Option<TimePeriod> {
        self.band(GOLDEN_HOUR_FLOOR, GOLDEN_HOUR_CEILING, edge, "golden hour")
    }

    fn band(&self, lower: f64, upper: f64, edge: Edge, label: &str) -> Option<TimePeriod> {
        let (start, end) = match edge {
            Edge::Rising => (self.crossing(lower, edge), self.crossing(upper, edge)),
            Edge::Setting => (self.crossing(upper, edge), self.crossing(lower, edge)),
        };
        match (start, end) {
            (Some(start), Some(end)) => TimePeriod::from_bounds(
                Some(start.fixed_offset()),
                Some(end.fixed_offset()),
            ),
            _ => {
                log::debug!(
                    "{label} ({edge:?}) unavailable for lat={} lon={} on {}",
                    self.observer.latitude,
                    self.observer.longitude,
                    self.date
                );
                None
            }
        }
    }
}

/// Dip of the apparent horizon below the geometric one for an elevated
/// observer, degrees.
fn horizon_dip_deg(elevation_m: f64) -> f64 {
    if elevation_m <= 0.0 {
        return 0.0;
    }
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    (EARTH_RADIUS_M / (EARTH_RADIUS_M + elevation_m)).acos().to_degrees()
}
