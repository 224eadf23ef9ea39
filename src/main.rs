use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use almanac::config::Settings;
use almanac::engine::{parse_date, AstroEngine};
use almanac::links;
use almanac::models::AstroQuery;
use almanac::timezone::LongitudeResolver;

#[derive(Parser)]
#[command(name = "almanac", about = "Sun and moon almanac for a location")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sun times, twilight windows, and moon data for a location
    Astro {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// ISO date (YYYY-MM-DD); defaults to today in the resolved timezone
        #[arg(long)]
        date: Option<String>,
        /// Force a specific IANA timezone (e.g. Europe/London)
        #[arg(long)]
        timezone: Option<String>,
        /// Observer elevation in meters
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        elevation: f64,
        /// Include per-stage timing in the response
        #[arg(long)]
        profile: bool,
    },
    /// Print the configured service links
    Links {
        /// Override the links file path
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let settings = Settings::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Astro {
            lat,
            lon,
            date,
            timezone,
            elevation,
            profile,
        } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let engine = AstroEngine::new(Arc::new(LongitudeResolver))
                .with_profiling(profile || settings.debug);
            let response = engine.astro(AstroQuery {
                lat,
                lon,
                date,
                tz_override: timezone,
                elevation_m: elevation,
            })?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Links { file } => {
            let path = file.unwrap_or(settings.links_file);
            let items = links::load_links(&path)
                .with_context(|| format!("loading links from {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}
