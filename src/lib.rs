//! Almanac - sun and moon event engine for location dashboards.
//!
//! Given a coordinate, an elevation, a calendar date, and an IANA timezone,
//! computes twilight events at three depression tiers, sunrise/sunset and
//! solar noon, blue/golden-hour windows, hourly solar and lunar elevation
//! series, lunar phase data, and next new/full moon dates. Events that do not
//! occur on a given day (polar day and night) come back absent instead of
//! failing the request.

pub mod astro;
pub mod config;
pub mod engine;
pub mod links;
pub mod metrics;
pub mod models;
pub mod timezone;

pub use engine::{parse_date, AstroEngine, EngineError};
pub use models::{AstroQuery, AstroResponse, MoonInfo, Observer, SunTimes, TimePeriod};
