use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Debug;

use crate::{
    Config, ScreenError,
    model::{Coordinates, CurrentWeather, ForecastSet, WeatherReport},
    provider::openweather::OpenWeatherClient,
};

pub mod openweather;

/// Read access to a weather service for a single point.
///
/// Both calls take the same coordinates and are independent of each other.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self, coords: Coordinates) -> anyhow::Result<CurrentWeather>;

    async fn fetch_forecast(&self, coords: Coordinates) -> anyhow::Result<ForecastSet>;
}

/// Run one fetch cycle: current conditions, then forecast.
///
/// A report is returned only when both requests succeed. When the forecast fails after
/// current conditions arrived, the current conditions are dropped and the error is
/// `ScreenError::PartialData`.
pub async fn fetch_report(
    source: &dyn WeatherSource,
    coords: Coordinates,
) -> Result<WeatherReport, ScreenError> {
    let current = source
        .fetch_current(coords)
        .await
        .map_err(|e| ScreenError::Network(format!("{e:#}")))?;

    let forecast = source
        .fetch_forecast(coords)
        .await
        .map_err(|e| ScreenError::PartialData(format!("{e:#}")))?;

    Ok(WeatherReport {
        coords,
        current,
        forecast,
        fetched_at: Utc::now(),
    })
}

/// Construct the OpenWeather client from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let client = OpenWeatherClient::from_config(config)?;
    Ok(Box::new(client))
}
