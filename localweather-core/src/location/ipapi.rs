//! IP-based geolocation through ipapi.co. Free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{error::LocationError, model::Coordinate};

use super::LocationSource;

const IPAPI_URL: &str = "https://ipapi.co/json/";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("localweather/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IpApiLocation {
    url: String,
    http: Option<Client>,
}

impl IpApiLocation {
    pub fn new() -> Self {
        Self::with_url(IPAPI_URL)
    }

    /// Point the locator at a different endpoint (used by tests).
    pub fn with_url(url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build();

        let http = match http {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("Failed to create geolocation client: {}", e);
                None
            }
        };

        Self { url: url.into(), http }
    }
}

impl Default for IpApiLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationSource for IpApiLocation {
    fn is_available(&self) -> bool {
        self.http.is_some()
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        let http = self.http.as_ref().ok_or(LocationError::Unavailable)?;

        let res = http.get(&self.url).send().await?;
        let status = res.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(LocationError::PositionUnavailable(format!(
                "geolocation service returned status {status}"
            )));
        }

        let body: IpApiResponse = res.json().await?;
        if body.error {
            return Err(LocationError::PositionUnavailable(
                body.reason.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => {
                tracing::debug!(city = ?body.city, latitude, longitude, "IP geolocation answered");
                Coordinate::new(latitude, longitude)
            }
            _ => Err(LocationError::PositionUnavailable(
                "response carried no coordinates".to_string(),
            )),
        }
    }
}
