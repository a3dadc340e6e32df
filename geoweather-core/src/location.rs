//! Geolocation seam: permission plus a one-shot position fix.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{Config, config::LocationMode, model::Coordinates};

pub const DEFAULT_IP_LOCATION_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Ask for foreground location access. May wait on the user indefinitely.
    async fn request_foreground_permission(&self) -> Result<Permission>;

    /// One-shot position fix.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Position known up front, e.g. from config or command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_foreground_permission(&self) -> Result<Permission> {
        Ok(Permission::Granted)
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Ok(self.coords)
    }
}

/// Approximate position looked up from the machine's public IP address.
#[derive(Debug, Clone)]
pub struct IpLocation {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocation {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { url: url.to_string(), http })
    }
}

#[async_trait]
impl LocationProvider for IpLocation {
    async fn request_foreground_permission(&self) -> Result<Permission> {
        Ok(Permission::Granted)
    }

    async fn current_position(&self) -> Result<Coordinates> {
        let res = self
            .http
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .context("Failed to send IP geolocation request")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("IP geolocation request failed with status {status}"));
        }

        let body: IpApiResponse =
            res.json().await.context("Failed to parse IP geolocation JSON")?;

        if body.status != "success" {
            return Err(anyhow!(
                "IP geolocation lookup failed: {}",
                body.message.as_deref().unwrap_or("no reason given")
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!(lat, lon, "resolved position from IP address");
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(anyhow!("IP geolocation response had no coordinates")),
        }
    }
}

/// Pick a provider: explicit coordinates win, then the configured mode.
pub fn location_from_config(
    config: &Config,
    explicit: Option<Coordinates>,
) -> Result<Box<dyn LocationProvider>> {
    if let Some(coords) = explicit {
        return Ok(Box::new(FixedLocation::new(coords)));
    }

    match config.location.mode {
        LocationMode::Fixed => {
            let coords = config.fixed_coordinates().ok_or_else(|| {
                anyhow!(
                    "Location mode is 'fixed' but no coordinates are configured.\n\
                     Hint: run `geoweather configure` or pass --lat/--lon."
                )
            })?;
            Ok(Box::new(FixedLocation::new(coords)))
        }
        LocationMode::Ip => Ok(Box::new(IpLocation::new(
            DEFAULT_IP_LOCATION_URL,
            Duration::from_secs(config.request_timeout_secs),
        )?)),
    }
}
