use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pair of geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// What the next request is about: a free-text city or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSelector {
    City(String),
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Current,
    Forecast,
}

impl RequestMode {
    pub fn endpoint(&self) -> &'static str {
        match self {
            RequestMode::Current => "weather",
            RequestMode::Forecast => "forecast",
        }
    }
}

/// Where the displayed answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Manual,
    Geolocation,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Manual => "вручную",
            Source::Geolocation => "по геопозиции",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One point-in-time reading for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
}

/// A forecast already reduced to one entry per local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city_name: String,
    pub days: Vec<ForecastEntry>,
}
