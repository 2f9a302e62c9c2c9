use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::{
    model::Location,
    provider::{DEFAULT_TTL, ProviderId},
};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Where the weather is fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "caiyun".
    pub default_provider: Option<String>,

    /// Seconds a fetched forecast is reused before asking upstream again.
    pub cache_ttl_secs: Option<u64>,

    /// Example TOML:
    /// [providers.caiyun]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Example TOML:
    /// [location]
    /// latitude = 31.23
    /// longitude = 121.47
    /// name = "Shanghai"
    pub location: Option<LocationConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `skyfeed configure <provider>` (e.g. `skyfeed configure caiyun`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyfeed", "skyfeed")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(LocationConfig {
            latitude: location.latitude,
            longitude: location.longitude,
            name: location.friendly_name,
        });
    }

    pub fn location(&self) -> Option<Location> {
        self.location.as_ref().map(|loc| Location {
            latitude: loc.latitude,
            longitude: loc.longitude,
            friendly_name: loc.name.clone(),
        })
    }

    /// Cache lifespan, falling back to one hour.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::CaiYun, "CY_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::CaiYun);

        assert_eq!(cfg.provider_api_key(ProviderId::CaiYun), Some("CY_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::CaiYun));
    }

    #[test]
    fn upsert_replaces_key_and_keeps_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::CaiYun, "OLD".into());
        cfg.upsert_provider_api_key(ProviderId::CaiYun, "NEW".into());

        assert_eq!(cfg.provider_api_key(ProviderId::CaiYun), Some("NEW"));
        assert_eq!(cfg.default_provider.as_deref(), Some("caiyun"));
    }

    #[test]
    fn unknown_default_provider_is_rejected() {
        let mut cfg = Config::default();
        cfg.default_provider = Some("openweather".to_string());

        assert!(cfg.default_provider_id().is_err());

        cfg.set_default_provider(ProviderId::CaiYun);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::CaiYun);
    }

    #[test]
    fn location_roundtrips_through_config() {
        let mut cfg = Config::default();
        assert!(cfg.location().is_none());

        cfg.set_location(Location::named(31.23, 121.47, "Shanghai"));
        assert_eq!(cfg.location(), Some(Location::named(31.23, 121.47, "Shanghai")));
    }

    #[test]
    fn cache_ttl_defaults_to_one_hour() {
        let mut cfg = Config::default();
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(3600));

        cfg.cache_ttl_secs = Some(600);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn parses_toml_file_contents() {
        let cfg = Config::from_toml(
            r#"
            default_provider = "caiyun"
            cache_ttl_secs = 900

            [providers.caiyun]
            api_key = "abc"

            [location]
            latitude = 39.9
            longitude = 116.4
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::CaiYun);
        assert_eq!(cfg.provider_api_key(ProviderId::CaiYun), Some("abc"));
        assert_eq!(cfg.location(), Some(Location::new(39.9, 116.4)));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(900));
    }
}
