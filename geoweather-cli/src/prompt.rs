//! Interactive prompts: the location permission dialog and `geoweather configure`.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use geoweather_core::{Config, Coordinates, LocationMode, LocationProvider, Permission, Units};
use std::io::IsTerminal;

use inquire::{Confirm, CustomType, InquireError, Password, PasswordDisplayMode, Select};

/// Wraps a location provider with a yes/no prompt standing in for the OS permission dialog.
#[derive(Debug)]
pub struct PromptedLocation {
    inner: Box<dyn LocationProvider>,
    pre_granted: bool,
}

impl PromptedLocation {
    pub fn new(inner: Box<dyn LocationProvider>, pre_granted: bool) -> Self {
        Self { inner, pre_granted }
    }
}

#[async_trait]
impl LocationProvider for PromptedLocation {
    async fn request_foreground_permission(&self) -> Result<Permission> {
        if self.pre_granted {
            return self.inner.request_foreground_permission().await;
        }

        if !std::io::stdin().is_terminal() {
            tracing::warn!("no terminal to ask for location permission; pass --yes to allow");
            return Ok(Permission::Denied);
        }

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow geoweather to use your location?")
                .with_default(true)
                .with_help_message("Your approximate position is looked up from your IP address")
                .prompt()
        })
        .await
        .context("Permission prompt task failed")?;

        match answer {
            Ok(true) => self.inner.request_foreground_permission().await,
            Ok(false) => Ok(Permission::Denied),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                Ok(Permission::Denied)
            }
            Err(InquireError::NotTTY) => {
                tracing::warn!("no terminal to ask for location permission; pass --yes to allow");
                Ok(Permission::Denied)
            }
            Err(e) => Err(anyhow!(e).context("Location permission prompt failed")),
        }
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.inner.current_position().await
    }
}

const MODE_IP: &str = "Approximate, from my IP address";
const MODE_FIXED: &str = "Fixed coordinates";

/// Walk the user through API key, units and location settings.
///
/// Starts from `existing` so re-running keeps what was there.
pub fn configure(existing: Config) -> Result<Config> {
    let mut cfg = existing;

    let key_prompt = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    let key_prompt = if cfg.api_key.is_some() {
        key_prompt.with_help_message("Leave empty to keep the current key")
    } else {
        key_prompt
    };
    let key = key_prompt.prompt()?;
    if !key.trim().is_empty() {
        cfg.set_api_key(key.trim().to_string());
    } else if cfg.api_key.is_none() {
        return Err(anyhow!("An API key is required"));
    }

    let units = Select::new("Units:", vec![Units::Metric, Units::Imperial, Units::Standard])
        .with_starting_cursor(match cfg.units {
            Units::Metric => 0,
            Units::Imperial => 1,
            Units::Standard => 2,
        })
        .prompt()?;
    cfg.units = units;

    let start = match cfg.location.mode {
        LocationMode::Ip => 0,
        LocationMode::Fixed => 1,
    };
    let mode = Select::new("Location source:", vec![MODE_IP, MODE_FIXED])
        .with_starting_cursor(start)
        .prompt()?;

    if mode == MODE_FIXED {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 35.68")
            .with_validator(|v: &f64| {
                Ok(if (-90.0..=90.0).contains(v) {
                    inquire::validator::Validation::Valid
                } else {
                    inquire::validator::Validation::Invalid("must be between -90 and 90".into())
                })
            })
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. 139.69")
            .with_validator(|v: &f64| {
                Ok(if (-180.0..=180.0).contains(v) {
                    inquire::validator::Validation::Valid
                } else {
                    inquire::validator::Validation::Invalid("must be between -180 and 180".into())
                })
            })
            .prompt()?;
        cfg.set_fixed_coordinates(Coordinates::new(latitude, longitude));
    } else {
        cfg.location.mode = LocationMode::Ip;
        cfg.location.allow = Confirm::new("Always allow location lookups without asking?")
            .with_default(cfg.location.allow)
            .prompt()?;
    }

    Ok(cfg)
}
