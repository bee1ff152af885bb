//! Widget state and the actions that drive it.
//!
//! [`WeatherWidget`] is a plain state container: actions mutate it and hand back a
//! [`RequestTicket`] for the request they start, and results are applied with that ticket.
//! Only the most recent ticket is honoured, so a slow response can never overwrite a newer one.
//! [`WidgetController`] wires the container to a provider and a geolocator.

use chrono::{FixedOffset, Local};
use tracing::{debug, info, warn};

use crate::{
    forecast::daily_representatives,
    geolocation::{GeolocationError, Geolocator},
    model::{Coordinates, Forecast, LocationSelector, RequestMode, Source, WeatherSnapshot},
    provider::{FetchError, WeatherProvider},
};

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub id: u64,
    pub selector: LocationSelector,
    pub mode: RequestMode,
}

/// What the widget shows right now. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<'a> {
    Idle,
    Loading,
    Error(&'a str),
    Current(&'a WeatherSnapshot, Source),
    Forecast(&'a Forecast, Source),
    GeolocationError(&'a str),
}

#[derive(Debug, Clone, Default)]
pub struct WeatherWidget {
    city_input: String,
    query: String,
    coords: Option<Coordinates>,
    source: Source,
    weather: Option<WeatherSnapshot>,
    forecast: Option<Forecast>,
    loading: bool,
    error: Option<String>,
    geo_error: Option<String>,
    latest_request: u64,
}

impl WeatherWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city_input(&self) -> &str {
        &self.city_input
    }

    pub fn set_city_input(&mut self, text: impl Into<String>) {
        self.city_input = text.into();
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coords
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub fn forecast(&self) -> Option<&Forecast> {
        self.forecast.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn geo_error(&self) -> Option<&str> {
        self.geo_error.as_deref()
    }

    /// Coordinates win when present, otherwise the last submitted city name.
    pub fn selector(&self) -> LocationSelector {
        match self.coords {
            Some(c) => LocationSelector::Coordinates(c),
            None => LocationSelector::City(self.query.clone()),
        }
    }

    /// Make the text in the input field the active location without starting a request.
    pub fn select_city(&mut self) {
        self.coords = None;
        self.query = self.city_input.clone();
        self.forecast = None;
        self.source = Source::Manual;
        self.geo_error = None;
    }

    /// Switch to a manual search for the text currently in the input field.
    pub fn submit_city(&mut self) -> RequestTicket {
        self.select_city();
        self.begin(RequestMode::Current)
    }

    pub fn request_forecast(&mut self) -> RequestTicket {
        self.begin(RequestMode::Forecast)
    }

    /// Apply the outcome of a position lookup.
    ///
    /// A success switches to coordinates and starts a current-weather request. A failure only
    /// sets the geolocation message; whatever is on screen stays there.
    pub fn apply_geolocation(
        &mut self,
        result: Result<Coordinates, GeolocationError>,
    ) -> Option<RequestTicket> {
        match result {
            Ok(c) => {
                info!(lat = c.latitude, lon = c.longitude, "position acquired");
                self.coords = Some(c);
                self.forecast = None;
                self.source = Source::Geolocation;
                self.geo_error = None;
                Some(self.begin(RequestMode::Current))
            }
            Err(e) => {
                warn!(error = %e, "position unavailable");
                self.geo_error = Some(e.to_string());
                None
            }
        }
    }

    /// Start a request: enter the loading state and issue a fresh ticket.
    pub fn begin(&mut self, mode: RequestMode) -> RequestTicket {
        self.latest_request += 1;
        self.loading = true;
        self.error = None;

        let ticket = RequestTicket {
            id: self.latest_request,
            selector: self.selector(),
            mode,
        };
        debug!(id = ticket.id, ?mode, selector = ?ticket.selector, "request started");
        ticket
    }

    fn is_current(&self, ticket: &RequestTicket) -> bool {
        if ticket.id != self.latest_request {
            debug!(
                id = ticket.id,
                latest = self.latest_request,
                "discarding stale response"
            );
            return false;
        }
        true
    }

    /// Returns `false` when the ticket was superseded and the result was dropped.
    pub fn apply_current(
        &mut self,
        ticket: &RequestTicket,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                // The provider's spelling of the place becomes the forecast header.
                self.city_input = snapshot.location_name.clone();
                self.weather = Some(snapshot);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    /// `forecast` is expected to be already reduced to one entry per day.
    pub fn apply_forecast(
        &mut self,
        ticket: &RequestTicket,
        result: Result<Forecast, FetchError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;

        match result {
            Ok(mut forecast) => {
                if forecast.city_name.is_empty() {
                    forecast.city_name = self.city_input.clone();
                }
                self.forecast = Some(forecast);
                self.weather = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    pub fn view(&self) -> ViewState<'_> {
        if self.loading {
            return ViewState::Loading;
        }
        if let Some(e) = &self.error {
            return ViewState::Error(e);
        }
        if let Some(f) = self.forecast.as_ref().filter(|f| !f.days.is_empty()) {
            return ViewState::Forecast(f, self.source);
        }
        if let Some(w) = &self.weather {
            return ViewState::Current(w, self.source);
        }
        if let Some(e) = &self.geo_error {
            return ViewState::GeolocationError(e);
        }
        ViewState::Idle
    }
}

/// Runs widget actions end to end against a provider and a geolocator.
#[derive(Debug)]
pub struct WidgetController<P, G> {
    widget: WeatherWidget,
    provider: P,
    geolocator: G,
    utc_offset: Option<FixedOffset>,
}

impl<P: WeatherProvider, G: Geolocator> WidgetController<P, G> {
    pub fn new(provider: P, geolocator: G) -> Self {
        Self {
            widget: WeatherWidget::new(),
            provider,
            geolocator,
            utc_offset: None,
        }
    }

    /// Group forecast days in a fixed offset instead of the system time zone.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn widget(&self) -> &WeatherWidget {
        &self.widget
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn submit_city(&mut self, city: impl Into<String>) {
        self.widget.set_city_input(city);
        let ticket = self.widget.submit_city();
        self.run_current(ticket).await;
    }

    /// Forecast for a city without fetching its current weather first.
    pub async fn forecast_for_city(&mut self, city: impl Into<String>) {
        self.widget.set_city_input(city);
        self.widget.select_city();
        self.show_forecast().await;
    }

    pub async fn use_geolocation(&mut self) {
        let position = self.geolocator.locate().await;
        if let Some(ticket) = self.widget.apply_geolocation(position) {
            self.run_current(ticket).await;
        }
    }

    pub async fn show_forecast(&mut self) {
        let ticket = self.widget.request_forecast();
        let result = self.provider.forecast(&ticket.selector).await.map(|mut f| {
            f.days = match self.utc_offset {
                Some(offset) => daily_representatives(f.days, &offset),
                None => daily_representatives(f.days, &Local),
            };
            f
        });

        if let Err(e) = &result {
            debug!(error = %e, "forecast request failed");
        }
        self.widget.apply_forecast(&ticket, result);
    }

    async fn run_current(&mut self, ticket: RequestTicket) {
        let result = self.provider.current(&ticket.selector).await;
        if let Err(e) = &result {
            debug!(error = %e, "current weather request failed");
        }
        self.widget.apply_current(&ticket, result);
    }
}
