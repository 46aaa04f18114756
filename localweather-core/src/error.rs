use thiserror::Error;

/// Why a position could not be obtained from a [`LocationSource`](crate::LocationSource).
#[derive(Debug, Error)]
pub enum LocationError {
    /// The platform has no geolocation capability at all.
    #[error("Geolocation not available")]
    Unavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl From<reqwest::Error> for LocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::PositionUnavailable(err.to_string())
        }
    }
}

/// A single weather fetch attempt failed.
#[derive(Debug, Error)]
pub enum WeatherFetchError {
    #[error("Failed to send request to weather provider: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather provider request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse weather provider JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Weather provider response contained no condition")]
    MissingCondition,
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
