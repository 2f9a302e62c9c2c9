use crate::{Config, Location, TemperatureUnit, WeatherError, WeatherRecord};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod cached;
pub mod caiyun;
pub mod fixed;

pub use cached::{CachedProvider, DEFAULT_TTL, RefreshSource};
pub use fixed::StaticProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    CaiYun,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::CaiYun => "caiyun",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::CaiYun]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "caiyun" => Ok(ProviderId::CaiYun),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: caiyun."
            )),
        }
    }
}

/// Source of weather records for one location.
///
/// `get_weather` returns records ordered from the most immediate to the
/// farthest future: the current record (if any), then hourly buckets, then
/// daily buckets. The number of records may change between calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn location(&self) -> &Location;

    /// Unit of every temperature this provider returns.
    fn temperature_unit(&self) -> TemperatureUnit;

    async fn get_weather(&self) -> Result<Vec<WeatherRecord>, WeatherError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `skyfeed configure {id}` and enter your API key."
        )
    })?;

    let location = config.location().ok_or_else(|| {
        anyhow::anyhow!(
            "No location configured.\n\
                 Hint: run `skyfeed configure {id}` and enter a latitude and longitude."
        )
    })?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::CaiYun => {
            Box::new(caiyun::provider(location, api_key.to_owned(), config.cache_ttl())?)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let parsed = ProviderId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("CaiYun").unwrap(), ProviderId::CaiYun);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn static_provider_is_not_configurable() {
        assert_eq!(ProviderId::all(), &[ProviderId::CaiYun]);

        let err = ProviderId::try_from("static").unwrap_err();
        assert!(err.to_string().contains("Supported providers: caiyun."));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::CaiYun, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_location() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::CaiYun, "KEY".to_string());

        let err = provider_from_config(ProviderId::CaiYun, &cfg).unwrap_err();
        assert!(err.to_string().contains("No location configured"));
    }

    #[test]
    fn default_provider_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let err = default_provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `skyfeed configure"));
    }

    #[tokio::test]
    async fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::CaiYun, "KEY".to_string());
        cfg.set_location(Location::named(31.23, 121.47, "Shanghai"));

        let provider = default_provider_from_config(&cfg).expect("provider should build");
        assert_eq!(provider.location().friendly_name.as_deref(), Some("Shanghai"));
        assert_eq!(provider.temperature_unit(), TemperatureUnit::Celsius);
    }
}
