use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::WeatherFetchError,
    model::{Coordinate, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Source of current conditions for a coordinate. One remote call per `fetch`.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, WeatherFetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `localweather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    Ok(Arc::new(OpenWeatherProvider::new(
        config.base_url.clone(),
        api_key.to_owned(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        };

        assert!(provider_from_config(&cfg).is_ok());
    }
}
