use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON_HOST: &str = "openweathermap.org";

/// WGS84 position in degrees.
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

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Unit system requested from the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn wind_label(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial, standard."
            )),
        }
    }
}

/// One weather condition descriptor: short code, human description, icon id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    /// Image URL for this condition's icon on the given host.
    pub fn icon_url(&self, host: &str) -> String {
        icon_url(host, &self.icon)
    }
}

pub fn icon_url(host: &str, icon: &str) -> String {
    format!("https://{host}/img/wn/{icon}@2x.png")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    /// Never empty when produced by a provider.
    pub conditions: Vec<Condition>,
    pub wind_speed: f64,
}

impl CurrentWeather {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Seconds since the Unix epoch.
    pub dt: i64,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: Condition,
}

/// Forecast entries in API order, which is chronological.
pub type ForecastSet = Vec<ForecastEntry>;

/// Current conditions and forecast committed together from one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub coords: Coordinates,
    pub current: CurrentWeather,
    pub forecast: ForecastSet,
    pub fetched_at: DateTime<Utc>,
}

/// Rounds half up, so 22.5 becomes 23 and -2.5 becomes -2.
pub fn round_temp(temp: f64) -> i64 {
    (temp + 0.5).floor() as i64
}

/// Temperature as shown on screen, e.g. `23°`.
pub fn display_temp(temp: f64) -> String {
    format!("{}°", round_temp(temp))
}
