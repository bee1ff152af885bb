//! Core library for the `weather` widget.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Request building and the OpenWeather provider
//! - Reduction of the 5-day/3-hour forecast to one entry per day
//! - Position lookup behind a pluggable trait
//! - The widget state machine and its text renderer
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod forecast;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod render;
pub mod request;
pub mod widget;

pub use config::Config;
pub use geolocation::{FixedGeolocator, GeolocationError, Geolocator, IpGeolocator, NoGeolocator};
pub use model::{
    Coordinates, Forecast, ForecastEntry, LocationSelector, RequestMode, Source, WeatherSnapshot,
};
pub use provider::{FetchError, WeatherProvider, openweather::OpenWeatherProvider};
pub use request::ApiSettings;
pub use widget::{RequestTicket, ViewState, WeatherWidget, WidgetController};
