use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{debug, info};
use weather_core::{
    Config, Coordinates, FixedGeolocator, Geolocator, IpGeolocator, OpenWeatherProvider,
    WeatherProvider, WidgetController, geolocation::DEFAULT_IP_LOOKUP_URL,
    provider::provider_from_config, render::render,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather widget for the terminal")]
pub struct Cli {
    /// API key to use instead of the configured one.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Explicit coordinates; when absent the position is looked up from the IP address.
#[derive(Debug, Clone, Copy, Args)]
pub struct PositionArgs {
    /// Latitude in decimal degrees.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PositionArgs {
    fn none() -> Self {
        Self { lat: None, lon: None }
    }

    fn geolocator(&self, config: &Config) -> anyhow::Result<Box<dyn Geolocator>> {
        let boxed: Box<dyn Geolocator> = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Box::new(FixedGeolocator(Coordinates::new(lat, lon))),
            _ => Box::new(IpGeolocator::new(DEFAULT_IP_LOOKUP_URL, config.timeout())?),
        };
        Ok(boxed)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather for a city.
    Current {
        /// City name, passed to the provider as-is.
        city: String,
    },

    /// Show the 5-day forecast, one entry per day.
    Forecast {
        /// City name; omit to use the current position.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Show current weather for the current position.
    Locate {
        #[command(flatten)]
        position: PositionArgs,
    },

    /// Run the widget as an interactive menu.
    Interactive {
        #[command(flatten)]
        position: PositionArgs,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Configure => "configure",
            Command::Current { .. } => "current",
            Command::Forecast { .. } => "forecast",
            Command::Locate { .. } => "locate",
            Command::Interactive { .. } => "interactive",
        }
    }
}

type Controller = WidgetController<OpenWeatherProvider, Box<dyn Geolocator>>;

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let mut config = Config::load()?;
        debug!(
            command = self.command.name(),
            key_override = self.api_key.is_some(),
            "configuration loaded"
        );

        let (mut ctl, menu) = match self.command {
            Command::Configure => {
                configure(&mut config)?;
                return Ok(ExitCode::SUCCESS);
            }
            Command::Current { city } => {
                let mut ctl = controller(&config, self.api_key.as_deref(), PositionArgs::none())?;
                ctl.submit_city(city).await;
                (ctl, false)
            }
            Command::Forecast { city, position } => {
                let mut ctl = controller(&config, self.api_key.as_deref(), position)?;
                match city {
                    Some(city) => ctl.forecast_for_city(city).await,
                    None => {
                        ctl.use_geolocation().await;
                        if ctl.widget().geo_error().is_none() {
                            ctl.show_forecast().await;
                        }
                    }
                }
                (ctl, false)
            }
            Command::Locate { position } => {
                let mut ctl = controller(&config, self.api_key.as_deref(), position)?;
                ctl.use_geolocation().await;
                (ctl, false)
            }
            Command::Interactive { position } => {
                (controller(&config, self.api_key.as_deref(), position)?, true)
            }
        };

        if menu {
            interactive::run(&mut ctl).await?;
            return Ok(ExitCode::SUCCESS);
        }

        print!("{}", render(ctl.widget(), ctl.provider().settings(), &Local));

        let failed = ctl.widget().error().is_some() || ctl.widget().geo_error().is_some();
        if failed {
            info!("command finished with an error state");
        }
        Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
}

fn controller(
    config: &Config,
    api_key: Option<&str>,
    position: PositionArgs,
) -> anyhow::Result<Controller> {
    let provider = provider_from_config(config, api_key)?;
    let geolocator = position.geolocator(config)?;
    Ok(WidgetController::new(provider, geolocator))
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Get one at https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    let path = config.save()?;

    info!(path = %path.display(), "configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "weather", "forecast", "--lat", "-33.87", "--lon", "151.21",
        ])
        .unwrap();

        match cli.command {
            Command::Forecast { city, position } => {
                assert!(city.is_none());
                assert_eq!(position.lat, Some(-33.87));
                assert_eq!(position.lon, Some(151.21));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["weather", "locate", "--lat", "10"]).is_err());
    }

    #[test]
    fn forecast_city_conflicts_with_coordinates() {
        let res = Cli::try_parse_from([
            "weather", "forecast", "Paris", "--lat", "48.85", "--lon", "2.35",
        ]);
        assert!(res.is_err());

        let cli = Cli::try_parse_from(["weather", "forecast", "Paris"]).unwrap();
        assert_eq!(cli.command.name(), "forecast");
    }

    #[test]
    fn global_api_key_after_subcommand() {
        let cli = Cli::try_parse_from(["weather", "current", "Paris", "--api-key", "K"]).unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("K"));
        assert!(matches!(cli.command, Command::Current { city } if city == "Paris"));
    }
}
