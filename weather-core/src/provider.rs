use crate::{
    Config,
    model::{Forecast, LocationSelector, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
    request::ApiSettings,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Failure of a single weather or forecast request.
///
/// `Display` is the text shown to the user, so `Api` prints the provider's own message verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Build an API error from a non-2xx response, preferring the `message` field of the body.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {status}"));

        FetchError::Api { status, message }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Addressing and display settings, used by the renderer for icon links.
    fn settings(&self) -> &ApiSettings;

    async fn current(&self, selector: &LocationSelector) -> Result<WeatherSnapshot, FetchError>;

    /// The raw 5-day/3-hour list; reduction to one entry per day happens in [`crate::forecast`].
    async fn forecast(&self, selector: &LocationSelector) -> Result<Forecast, FetchError>;
}

/// Construct the OpenWeather provider from config, with an optional explicit API key.
pub fn provider_from_config(
    config: &Config,
    key_override: Option<&str>,
) -> anyhow::Result<OpenWeatherProvider> {
    let settings = config.api_settings(key_override)?;
    OpenWeatherProvider::with_timeout(settings, config.timeout())
}
