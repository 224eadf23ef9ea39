//! Process configuration from the environment.

use std::env;
use std::path::PathBuf;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    /// Enables per-stage profiling in responses.
    pub debug: bool,
    /// Where the service link list lives.
    pub links_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "almanac".to_string(),
            debug: false,
            links_file: PathBuf::from("links.yaml"),
        }
    }
}

impl Settings {
    /// Read settings from `ALMANAC_*` environment variables, keeping the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(value) = env::var("ALMANAC_APP_NAME") {
            settings.app_name = value;
        }
        if let Ok(value) = env::var("ALMANAC_DEBUG") {
            settings.debug = matches!(value.as_str(), "1" | "true" | "yes");
        }
        if let Ok(value) = env::var("ALMANAC_LINKS_FILE") {
            settings.links_file = PathBuf::from(value);
        }
        settings
    }
}
