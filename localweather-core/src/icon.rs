//! Provider condition → display icon.
//!
//! The table is deliberately coarse (haze shows as a clear day). It is what the UI has
//! always shown, so keep it as is.

use crate::model::{DisplayIcon, WeatherCondition};

pub fn classify(condition: &WeatherCondition) -> DisplayIcon {
    match condition {
        WeatherCondition::Haze => DisplayIcon::ClearDay,
        WeatherCondition::Clouds => DisplayIcon::Cloudy,
        WeatherCondition::Rain => DisplayIcon::Rain,
        WeatherCondition::Snow => DisplayIcon::Snow,
        WeatherCondition::Dust | WeatherCondition::Tornado => DisplayIcon::Wind,
        WeatherCondition::Drizzle => DisplayIcon::Sleet,
        WeatherCondition::Fog | WeatherCondition::Smoke => DisplayIcon::Fog,
        WeatherCondition::Clear | WeatherCondition::Other(_) => DisplayIcon::ClearDay,
    }
}

/// Classify a raw provider label such as `"Clouds"`.
pub fn classify_label(label: &str) -> DisplayIcon {
    classify(&WeatherCondition::from(label))
}
