use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    Config,
    model::{Condition, Coordinates, CurrentWeather, ForecastEntry, ForecastSet, Units},
};

use super::WeatherSource;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: &str, units: Units, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            units,
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_key()?.to_owned(),
            &config.base_url,
            config.units,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        label: &str,
        coords: Coordinates,
    ) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        tracing::debug!(%url, %lat, %lon, units = %self.units, "requesting OpenWeather {label}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({label})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {label} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {label} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {label} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

impl From<OwWeather> for Condition {
    fn from(w: OwWeather) -> Self {
        Condition {
            main: w.main,
            description: w.description,
            icon: w.icon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwCurrentMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentWeather> {
        let parsed: OwCurrentResponse = self.get_json("weather", "current", coords).await?;

        if parsed.weather.is_empty() {
            return Err(anyhow!("OpenWeather current response contained no conditions"));
        }

        Ok(CurrentWeather {
            name: parsed.name,
            temp: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            conditions: parsed.weather.into_iter().map(Condition::from).collect(),
            wind_speed: parsed.wind.speed,
        })
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<ForecastSet> {
        let parsed: OwForecastResponse = self.get_json("forecast", "forecast", coords).await?;

        parsed
            .list
            .into_iter()
            .map(|entry| -> Result<ForecastEntry> {
                let condition = entry.weather.into_iter().next().ok_or_else(|| {
                    anyhow!("OpenWeather forecast entry at {} contained no conditions", entry.dt)
                })?;

                Ok(ForecastEntry {
                    dt: entry.dt,
                    temp: entry.main.temp,
                    temp_min: entry.main.temp_min,
                    temp_max: entry.main.temp_max,
                    condition: condition.into(),
                })
            })
            .collect()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenWeatherClient::new(
            "KEY".into(),
            "http://localhost:1234/data/2.5/",
            Units::Metric,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/data/2.5");
    }
}
