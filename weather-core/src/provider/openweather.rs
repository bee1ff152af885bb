use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::DEFAULT_TIMEOUT_SECS,
    model::{Forecast, ForecastEntry, LocationSelector, RequestMode, WeatherSnapshot},
    request::{ApiSettings, build_url},
};

use super::{FetchError, WeatherProvider};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    settings: ApiSettings,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(settings: ApiSettings) -> anyhow::Result<Self> {
        Self::with_timeout(settings, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(settings: ApiSettings, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { settings, http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        selector: &LocationSelector,
        mode: RequestMode,
    ) -> Result<T, FetchError> {
        let url = build_url(&self.settings, selector, mode)?;
        debug!(endpoint = mode.endpoint(), ?selector, "sending OpenWeather request");

        let res = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, "OpenWeather request could not be sent");
            FetchError::Network(e)
        })?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let err = FetchError::from_response(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "OpenWeather request failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Default, Deserialize)]
struct OwCity {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn first_condition(weather: &[OwWeather]) -> Result<&OwWeather, FetchError> {
    weather
        .first()
        .ok_or_else(|| FetchError::Malformed("response has an empty `weather` array".into()))
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::Malformed(format!("timestamp out of range: {ts}")))
}

impl TryFrom<OwCurrentResponse> for WeatherSnapshot {
    type Error = FetchError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let condition = first_condition(&parsed.weather)?;

        Ok(WeatherSnapshot {
            location_name: parsed.name.clone(),
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed_mps: parsed.wind.speed,
            sunrise: unix_to_utc(parsed.sys.sunrise)?,
            sunset: unix_to_utc(parsed.sys.sunset)?,
            description: condition.description.clone(),
            icon: condition.icon.clone(),
        })
    }
}

impl TryFrom<OwForecastEntry> for ForecastEntry {
    type Error = FetchError;

    fn try_from(entry: OwForecastEntry) -> Result<Self, Self::Error> {
        let condition = first_condition(&entry.weather)?;

        Ok(ForecastEntry {
            time: unix_to_utc(entry.dt)?,
            temperature_c: entry.main.temp,
            humidity_pct: entry.main.humidity,
            pressure_hpa: entry.main.pressure,
            wind_speed_mps: entry.wind.speed,
            description: condition.description.clone(),
            icon: condition.icon.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    async fn current(&self, selector: &LocationSelector) -> Result<WeatherSnapshot, FetchError> {
        let parsed: OwCurrentResponse = self.get_json(selector, RequestMode::Current).await?;
        parsed.try_into()
    }

    async fn forecast(&self, selector: &LocationSelector) -> Result<Forecast, FetchError> {
        let parsed: OwForecastResponse = self.get_json(selector, RequestMode::Forecast).await?;

        let days = parsed
            .list
            .into_iter()
            .map(ForecastEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Forecast { city_name: parsed.city.name, days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_response_maps_to_snapshot() {
        let body = r#"{
            "name": "Paris",
            "main": {"temp": 21.6, "humidity": 40, "pressure": 1013, "feels_like": 20.0},
            "weather": [{"description": "ясно", "icon": "01d", "main": "Clear"}],
            "wind": {"speed": 3.5},
            "sys": {"sunrise": 1700000000, "sunset": 1700030000, "country": "FR"}
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(body).unwrap();
        let snap = WeatherSnapshot::try_from(parsed).unwrap();

        assert_eq!(snap.location_name, "Paris");
        assert_eq!(snap.pressure_hpa, 1013);
        assert_eq!(snap.icon, "01d");
        assert_eq!(snap.sunrise.timestamp(), 1_700_000_000);
    }

    #[test]
    fn empty_weather_array_is_malformed() {
        let body = r#"{
            "name": "X",
            "main": {"temp": 1.0, "humidity": 1, "pressure": 1},
            "weather": [],
            "wind": {"speed": 0.0},
            "sys": {"sunrise": 0, "sunset": 0}
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(body).unwrap();
        let err = WeatherSnapshot::try_from(parsed).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
