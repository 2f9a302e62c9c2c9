//! Core library for `skyfeed` weather displays.
//!
//! This crate defines:
//! - The unified weather model (records, sky conditions, buckets)
//! - Abstraction over weather providers, plus a time-to-live cache decorator
//! - The CaiYun provider, which parses and classifies its payload
//! - Display lookups and chart data consumed by widgets
//! - Configuration & credentials handling
//!
//! It is used by `skyfeed-cli`, but widgets and other binaries only need the
//! [`WeatherProvider`] trait.

pub mod config;
pub mod error;
pub mod model;
pub mod present;
pub mod provider;

pub use config::{Config, LocationConfig, ProviderConfig};
pub use error::WeatherError;
pub use model::{Day, Location, TemperatureUnit, WeatherEffectiveness, WeatherRecord};
pub use present::TrendSeries;
pub use provider::{
    CachedProvider, ProviderId, RefreshSource, StaticProvider, WeatherProvider,
    caiyun::CaiYunProvider,
};
