use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{WeatherFetchError, truncate_body},
    icon::classify,
    model::{Coordinate, WeatherCondition, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    fn current_url(&self) -> String {
        format!("{}/weather", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
}

/// Turn a current-weather body into a snapshot.
pub fn parse_current(body: &str) -> Result<WeatherSnapshot, WeatherFetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;

    let label = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.main)
        .ok_or(WeatherFetchError::MissingCondition)?;
    let condition = WeatherCondition::from(label);
    let icon = classify(&condition);

    Ok(WeatherSnapshot {
        city_name: parsed.name,
        country_code: parsed.sys.country,
        temperature_celsius: round_half_up(parsed.main.temp),
        condition,
        humidity_percent: parsed.main.humidity,
        icon,
    })
}

/// Halves round towards +inf: 31.5 -> 32, -2.5 -> -2.
fn round_half_up(value: f64) -> i32 {
    // `value + 0.5` can round up in f64 before the floor, so compare the fraction instead.
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, WeatherFetchError> {
        let lat = coordinate.latitude().to_string();
        let lon = coordinate.longitude().to_string();

        tracing::debug!(%coordinate, "requesting current weather");

        let res = self
            .http
            .get(self.current_url())
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", "metric"),
                ("APPID", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherFetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let snapshot = parse_current(&body)?;
        tracing::debug!(
            city = %snapshot.city_name,
            temperature = snapshot.temperature_celsius,
            condition = %snapshot.condition,
            "current weather received"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DisplayIcon;

    fn body(condition: &str, temp: f64) -> String {
        serde_json::json!({
            "name": "Delhi",
            "sys": { "country": "IN" },
            "main": { "temp": temp, "humidity": 40 },
            "weather": [{ "main": condition, "description": "whatever" }]
        })
        .to_string()
    }

    #[test]
    fn parses_delhi_haze() {
        let snapshot = parse_current(&body("Haze", 31.4)).unwrap();

        assert_eq!(
            snapshot,
            WeatherSnapshot {
                city_name: "Delhi".into(),
                country_code: "IN".into(),
                temperature_celsius: 31,
                condition: WeatherCondition::Haze,
                humidity_percent: 40,
                icon: DisplayIcon::ClearDay,
            }
        );
    }

    #[test]
    fn attaches_icon_for_condition() {
        assert_eq!(parse_current(&body("Rain", 20.0)).unwrap().icon, DisplayIcon::Rain);
        assert_eq!(parse_current(&body("Smoke", 20.0)).unwrap().icon, DisplayIcon::Fog);

        let blizzard = parse_current(&body("Blizzard", -4.0)).unwrap();
        assert_eq!(blizzard.icon, DisplayIcon::ClearDay);
        assert_eq!(blizzard.condition, WeatherCondition::Other("Blizzard".into()));
    }

    #[test]
    fn temperature_rounds_half_up() {
        assert_eq!(round_half_up(31.5), 32);
        assert_eq!(round_half_up(31.49), 31);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(0.49999999999999994), 0);
        assert_eq!(round_half_up(-0.5), 0);
    }

    #[test]
    fn empty_weather_list_is_an_error() {
        let body = serde_json::json!({
            "name": "Nowhere",
            "sys": { "country": "XX" },
            "main": { "temp": 1.0, "humidity": 1 },
            "weather": []
        })
        .to_string();

        assert!(matches!(parse_current(&body), Err(WeatherFetchError::MissingCondition)));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(
            parse_current(r#"{"cod":"401","message":"Invalid API key"}"#),
            Err(WeatherFetchError::Parse(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_tolerated() {
        let provider = OpenWeatherProvider::new("https://example.test/data/2.5/", "KEY");
        assert_eq!(provider.current_url(), "https://example.test/data/2.5/weather");
    }
}
