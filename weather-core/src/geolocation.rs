//! Acquisition of the viewer's current position.
//!
//! A terminal has no built-in position service, so the capability is a trait with a few
//! interchangeable sources. Failures collapse to two fixed user-facing messages and never mix
//! with weather request errors.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Coordinates;

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Невозможно получить доступ к геолокации. Введите город вручную.")]
    PermissionDenied,

    #[error("Геолокация не поддерживается вашей системой.")]
    Unsupported,
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

#[async_trait]
impl<G: Geolocator + ?Sized> Geolocator for Box<G> {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        (**self).locate().await
    }
}

/// Coordinates supplied up front, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// No position source at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Approximate position derived from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            warn!(error = %e, "IP geolocation lookup failed");
            GeolocationError::PermissionDenied
        })?;

        if !res.status().is_success() {
            warn!(status = res.status().as_u16(), "IP geolocation lookup rejected");
            return Err(GeolocationError::PermissionDenied);
        }

        let body: IpLookupResponse = res.json().await.map_err(|e| {
            warn!(error = %e, "IP geolocation response is not valid JSON");
            GeolocationError::PermissionDenied
        })?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => {
                debug!(lat, lon, "IP geolocation resolved");
                Ok(Coordinates::new(lat, lon))
            }
            _ => {
                warn!(status = %body.status, message = ?body.message, "IP geolocation unavailable");
                Err(GeolocationError::PermissionDenied)
            }
        }
    }
}
