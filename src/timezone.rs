//! Timezone resolution seam.
//!
//! Precise coordinate-to-zone lookup is a spatial-index problem that belongs
//! to an external service; the engine only depends on this trait. The
//! implementations here are deliberately simple but well behaved: they always
//! produce a usable IANA name, falling back to "UTC".

use chrono_tz::Tz;

/// Resolves an IANA timezone name from coordinates.
///
/// Constructed once at startup and shared read-only across requests.
pub trait TimezoneResolver: Send + Sync {
    fn resolve(&self, lat: f64, lon: f64) -> anyhow::Result<String>;
}

/// Nearest-offset resolver: picks the `Etc/GMT±N` zone matching the
/// longitude's natural 15°-wide band. A coarse stand-in for a real spatial
/// lookup, but deterministic and always valid.
pub struct LongitudeResolver;

impl TimezoneResolver for LongitudeResolver {
    fn resolve(&self, _lat: f64, lon: f64) -> anyhow::Result<String> {
        let offset = (lon / 15.0).round() as i32;
        if offset == 0 {
            return Ok("UTC".to_string());
        }
        // POSIX sign convention: Etc/GMT-1 is one hour *east* of Greenwich.
        let name = if offset > 0 {
            format!("Etc/GMT-{offset}")
        } else {
            format!("Etc/GMT+{}", -offset)
        };
        if name.parse::<Tz>().is_err() {
            log::warn!("no Etc zone for offset {offset} (lon={lon}); using UTC");
            return Ok("UTC".to_string());
        }
        Ok(name)
    }
}

/// Resolver that answers "UTC" for every coordinate.
pub struct UtcResolver;

impl TimezoneResolver for UtcResolver {
    fn resolve(&self, _lat: f64, _lon: f64) -> anyhow::Result<String> {
        Ok("UTC".to_string())
    }
}
