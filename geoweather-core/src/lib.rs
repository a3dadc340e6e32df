//! Core library for the `geoweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherSource` trait
//! - The geolocation seam (`LocationProvider`)
//! - Forecast display ordering
//! - The screen controller state machine tying them together
//!
//! It is used by `geoweather-cli`, but holds no presentation code of its own.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod sort;

pub use config::{Config, LocationConfig, LocationMode};
pub use controller::{RefreshOutcome, ScreenController, ScreenState};
pub use error::ScreenError;
pub use location::{FixedLocation, IpLocation, LocationProvider, Permission};
pub use model::{
    Condition, Coordinates, CurrentWeather, ForecastEntry, ForecastSet, Units, WeatherReport,
    display_temp,
};
pub use provider::{WeatherSource, fetch_report, openweather::OpenWeatherClient};
pub use sort::{SortCriterion, sort_forecast};
