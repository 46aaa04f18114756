use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{
    CustomType, CustomUserError, Password, PasswordDisplayMode, Text, validator::Validation,
};
use localweather_core::{
    Config, Coordinate, FixedLocation, IpApiLocation, LocationError, LocationSource,
    LocationWeatherController, NoLocation, Notice, PositionResolver, Resolution, WeatherSnapshot,
    WeatherState, provider_from_config,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "localweather", version, about = "Current weather for where you are")]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and refresh settings.
    Configure,

    /// Show current weather once.
    Show {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show current weather and keep refreshing until Ctrl-C.
    Watch {
        #[command(flatten)]
        location: LocationArgs,

        /// Refresh interval in milliseconds; defaults to the configured value.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude to use instead of detecting the location.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to use instead of detecting the location.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Behave as if no geolocation is available.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    no_locate: bool,
}

impl LocationArgs {
    fn source(&self) -> anyhow::Result<Box<dyn LocationSource>> {
        if self.no_locate {
            return Ok(Box::new(NoLocation));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                let coordinate = Coordinate::new(lat, lon).context("Invalid --lat/--lon")?;
                Ok(Box::new(FixedLocation(coordinate)))
            }
            _ => Ok(Box::new(IpApiLocation::new())),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location } => show(&location).await,
            Command::Watch { location, interval_ms } => watch(&location, interval_ms).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key prompt cancelled")?;
    cfg.set_api_key(api_key);

    cfg.base_url = Text::new("API base URL:")
        .with_default(&cfg.base_url)
        .prompt()
        .context("Base URL prompt cancelled")?;

    cfg.refresh_interval_ms = CustomType::<u64>::new("Refresh interval (ms):")
        .with_default(cfg.refresh_interval_ms)
        .with_validator(|ms: &u64| -> Result<Validation, CustomUserError> {
            if *ms == 0 {
                Ok(Validation::Invalid("must be greater than zero".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Interval prompt cancelled")?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(location: &LocationArgs) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let provider = provider_from_config(&cfg)?;
    let resolver = PositionResolver::new(location.source()?).with_fallback(cfg.fallback);

    let coordinate = match resolver.resolve().await {
        Ok(Resolution::Located(coordinate)) => coordinate,
        Ok(Resolution::Fallback { coordinate, .. }) => {
            print_notice(Notice::LocationFallbackUsed);
            coordinate
        }
        Err(LocationError::Unavailable) => {
            print_notice(Notice::LocationUnavailable);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = provider
        .fetch(coordinate)
        .await
        .with_context(|| format!("Failed to fetch weather for {coordinate}"))?;
    println!("{}", render(&snapshot));
    Ok(())
}

async fn watch(location: &LocationArgs, interval_ms: Option<u64>) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let provider = provider_from_config(&cfg)?;
    let interval = match interval_ms {
        Some(ms) => Config { refresh_interval_ms: ms, ..cfg.clone() }.refresh_interval()?,
        None => cfg.refresh_interval()?,
    };

    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let notices = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            print_notice(notice);
        }
    });

    let resolver = PositionResolver::new(location.source()?).with_fallback(cfg.fallback);
    let mut controller =
        LocationWeatherController::new(resolver, provider, Arc::new(notice_tx), interval);
    let mut states = controller.subscribe();

    println!("Detecting your location...");
    controller.start().await;

    loop {
        let state = states.borrow_and_update().clone();
        match state {
            WeatherState::Loading => {}
            WeatherState::Ready(snapshot) => {
                let now = chrono::Local::now().format("%H:%M:%S");
                println!("[{now}] {}", render(&snapshot));
            }
            WeatherState::Unavailable => break,
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.dispose();
    // Dropping the controller closes the notice channel.
    drop(controller);
    notices.await.ok();
    Ok(())
}

fn print_notice(notice: Notice) {
    eprintln!("! {notice}");
}

fn render(snapshot: &WeatherSnapshot) -> String {
    format!(
        "{}, {}  {}°C  {} [{}]  humidity {}%",
        snapshot.city_name,
        snapshot.country_code,
        snapshot.temperature_celsius,
        snapshot.condition,
        snapshot.icon,
        snapshot.humidity_percent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use localweather_core::{DisplayIcon, WeatherCondition};

    #[test]
    fn render_shows_all_fields() {
        let snapshot = WeatherSnapshot {
            city_name: "Delhi".into(),
            country_code: "IN".into(),
            temperature_celsius: 31,
            condition: WeatherCondition::Haze,
            humidity_percent: 40,
            icon: DisplayIcon::ClearDay,
        };

        assert_eq!(render(&snapshot), "Delhi, IN  31°C  Haze [CLEAR_DAY]  humidity 40%");
    }

    #[test]
    fn coordinates_require_each_other() {
        assert!(Cli::try_parse_from(["localweather", "show", "--lat", "1.0"]).is_err());
        let both = ["localweather", "show", "--lat", "1.0", "--lon", "-2.0"];
        assert!(Cli::try_parse_from(both).is_ok());
    }

    #[test]
    fn no_locate_conflicts_with_coordinates() {
        let args = ["localweather", "watch", "--no-locate", "--lat", "1.0", "--lon", "2.0"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let args = LocationArgs { lat: Some(91.0), lon: Some(0.0), no_locate: false };
        assert!(args.source().is_err());

        let args = LocationArgs { lat: None, lon: None, no_locate: true };
        assert!(!args.source().unwrap().is_available());
    }
}
