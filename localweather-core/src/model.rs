use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use crate::error::LocationError;

/// A latitude/longitude pair in decimal degrees (WGS84).
///
/// Values are range-checked on construction and cannot change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] / [-180, 180] (and NaN).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    pub(crate) const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCoordinate::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// Primary condition label reported by the weather provider (`weather[0].main`).
///
/// Labels are matched exactly and case-sensitively; anything not listed is kept verbatim
/// in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Dust,
    Drizzle,
    Fog,
    Smoke,
    Tornado,
    Haze,
    Other(String),
}

impl WeatherCondition {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Dust => "Dust",
            Self::Drizzle => "Drizzle",
            Self::Fog => "Fog",
            Self::Smoke => "Smoke",
            Self::Tornado => "Tornado",
            Self::Haze => "Haze",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for WeatherCondition {
    fn from(label: &str) -> Self {
        match label {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Snow" => Self::Snow,
            "Dust" => Self::Dust,
            "Drizzle" => Self::Drizzle,
            "Fog" => Self::Fog,
            "Smoke" => Self::Smoke,
            "Tornado" => Self::Tornado,
            "Haze" => Self::Haze,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for WeatherCondition {
    fn from(label: String) -> Self {
        match Self::from(label.as_str()) {
            Self::Other(_) => Self::Other(label),
            known => known,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WeatherCondition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WeatherCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Icon categories used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayIcon {
    #[default]
    ClearDay,
    Cloudy,
    Rain,
    Snow,
    Wind,
    Sleet,
    Fog,
}

impl DisplayIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearDay => "CLEAR_DAY",
            Self::Cloudy => "CLOUDY",
            Self::Rain => "RAIN",
            Self::Snow => "SNOW",
            Self::Wind => "WIND",
            Self::Sleet => "SLEET",
            Self::Fog => "FOG",
        }
    }
}

impl fmt::Display for DisplayIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one successful weather fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub country_code: String,
    pub temperature_celsius: i32,
    pub condition: WeatherCondition,
    pub humidity_percent: u8,
    pub icon: DisplayIcon,
}

/// What the presentation layer sees of the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeatherState {
    /// No snapshot yet.
    #[default]
    Loading,
    Ready(Arc<WeatherSnapshot>),
    /// Geolocation capability is missing; no snapshot will ever appear.
    Unavailable,
}

impl WeatherState {
    pub fn snapshot(&self) -> Option<&Arc<WeatherSnapshot>> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
