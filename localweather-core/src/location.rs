use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::LocationError, model::Coordinate};

pub mod ipapi;

pub use ipapi::IpApiLocation;

/// Used when the position query fails (New Delhi, India).
pub const FALLBACK_COORDINATE: Coordinate = Coordinate::new_unchecked(28.67, 77.22);

/// A one-shot geolocation capability.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    /// Whether the capability exists at all. Checked before every query.
    fn is_available(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for Box<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        (**self).current_position().await
    }
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationSource for FixedLocation {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// A platform without geolocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Outcome of a successful [`PositionResolver::resolve`].
#[derive(Debug)]
pub enum Resolution {
    Located(Coordinate),
    /// The query failed and the fallback coordinate was substituted.
    Fallback {
        coordinate: Coordinate,
        cause: LocationError,
    },
}

impl Resolution {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Self::Located(coordinate) | Self::Fallback { coordinate, .. } => *coordinate,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug)]
pub struct PositionResolver<S> {
    source: S,
    fallback: Coordinate,
}

impl<S: LocationSource> PositionResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source, fallback: FALLBACK_COORDINATE }
    }

    pub fn with_fallback(mut self, fallback: Coordinate) -> Self {
        self.fallback = fallback;
        self
    }

    /// Query the source once.
    ///
    /// Returns `Err(LocationError::Unavailable)` only when the capability is missing; every
    /// other failure becomes [`Resolution::Fallback`].
    pub async fn resolve(&self) -> Result<Resolution, LocationError> {
        if !self.source.is_available() {
            tracing::warn!("geolocation capability not available");
            return Err(LocationError::Unavailable);
        }

        match self.source.current_position().await {
            Ok(coordinate) => {
                tracing::info!(%coordinate, "position resolved");
                Ok(Resolution::Located(coordinate))
            }
            Err(cause) => {
                tracing::warn!(
                    error = %cause,
                    fallback = %self.fallback,
                    "position query failed; using fallback"
                );
                Ok(Resolution::Fallback { coordinate: self.fallback, cause })
            }
        }
    }
}
