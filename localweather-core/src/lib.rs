//! Core library for `localweather`.
//!
//! This crate defines:
//! - Position resolution with a fixed fallback
//! - Current-weather fetching from OpenWeather and icon classification
//! - A refresh timer and the controller that ties them together
//! - Configuration & credentials handling
//!
//! It is used by `localweather-cli`, but the controller only talks to traits
//! ([`LocationSource`], [`WeatherProvider`], [`Notifier`]), so other hosts can plug in their own.

pub mod config;
pub mod controller;
pub mod error;
pub mod icon;
pub mod location;
pub mod model;
pub mod notify;
pub mod provider;
pub mod scheduler;

pub use config::Config;
pub use controller::LocationWeatherController;
pub use error::{LocationError, WeatherFetchError};
pub use icon::{classify, classify_label};
pub use location::{
    FALLBACK_COORDINATE, FixedLocation, IpApiLocation, LocationSource, NoLocation,
    PositionResolver, Resolution,
};
pub use model::{Coordinate, DisplayIcon, WeatherCondition, WeatherSnapshot, WeatherState};
pub use notify::{LogNotifier, Notice, Notifier};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use scheduler::{DEFAULT_REFRESH_INTERVAL, RefreshScheduler};
