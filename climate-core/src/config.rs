use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};
use tracing::debug;

use crate::{
    anomaly::DEFAULT_DEVIATION_C,
    provider::ProviderId,
    waves::{COLD_WAVE_THRESHOLD_C, HEAT_WAVE_THRESHOLD_C, MINIMUM_RUN_DAYS, WaveCriteria},
};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Alert thresholds, all temperatures in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub heat_wave_c: f64,
    pub cold_wave_c: f64,
    pub minimum_run_days: usize,
    pub anomaly_deviation_c: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heat_wave_c: HEAT_WAVE_THRESHOLD_C,
            cold_wave_c: COLD_WAVE_THRESHOLD_C,
            minimum_run_days: MINIMUM_RUN_DAYS,
            anomaly_deviation_c: DEFAULT_DEVIATION_C,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.heat_wave_c.is_finite() && self.cold_wave_c.is_finite(),
            "Heat and cold wave thresholds must be finite numbers"
        );
        ensure!(
            self.cold_wave_c < self.heat_wave_c,
            "Cold wave threshold ({}°C) must be below heat wave threshold ({}°C)",
            self.cold_wave_c,
            self.heat_wave_c
        );
        ensure!(
            self.anomaly_deviation_c.is_finite() && self.anomaly_deviation_c >= 0.0,
            "Anomaly deviation must be a non-negative number, got {}",
            self.anomaly_deviation_c
        );
        Ok(())
    }

    pub fn heat_criteria(&self) -> WaveCriteria {
        WaveCriteria { threshold_c: self.heat_wave_c, minimum_run: self.minimum_run_days }
    }

    pub fn cold_criteria(&self) -> WaveCriteria {
        WaveCriteria { threshold_c: self.cold_wave_c, minimum_run: self.minimum_run_days }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openmeteo" or "openweather".
    pub default_provider: Option<String>,

    /// Location used when a command is given none.
    pub default_location: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Open-Meteo needs no key, so it is the fallback when nothing is set.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Resolve the location argument of a command against the configured default.
    pub fn location_or_default<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit.or(self.default_location.as_deref()).ok_or_else(|| {
            anyhow!(
                "No location given and no default location configured.\n\
                 Hint: pass a location (see `climate locations`) or set `default_location` in {}.",
                Self::config_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            )
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.thresholds.validate()?;
        Ok(cfg)
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

        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climate-watch", "climate-cli")
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
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_falls_back_to_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn unknown_default_provider_errors() {
        let cfg = Config { default_provider: Some("darksky".into()), ..Config::default() };
        let err = cfg.default_provider_id().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::OpenMeteo);

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn open_meteo_is_always_configured() {
        let cfg = Config::default();
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn thresholds_default_when_section_missing() {
        let cfg = Config::from_toml("default_location = \"Cairo\"\n").unwrap();
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.thresholds.heat_criteria(), WaveCriteria::heat());
        assert_eq!(cfg.thresholds.cold_criteria(), WaveCriteria::cold());
    }

    #[test]
    fn partial_thresholds_section_keeps_other_defaults() {
        let cfg = Config::from_toml("[thresholds]\nheat_wave_c = 38.0\n").unwrap();
        assert_eq!(cfg.thresholds.heat_wave_c, 38.0);
        assert_eq!(cfg.thresholds.minimum_run_days, 3);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err =
            Config::from_toml("[thresholds]\nheat_wave_c = 5.0\ncold_wave_c = 10.0\n").unwrap_err();
        assert!(err.to_string().contains("must be below heat wave threshold"));
    }

    #[test]
    fn toml_roundtrip_keeps_keys() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
        cfg.default_location = Some("Lagos".into());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&text).unwrap();

        assert_eq!(parsed.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
        assert_eq!(parsed.default_location.as_deref(), Some("Lagos"));
    }

    #[test]
    fn location_prefers_explicit_argument() {
        let cfg = Config { default_location: Some("Accra".into()), ..Config::default() };
        assert_eq!(cfg.location_or_default(Some("Dakar")).unwrap(), "Dakar");
        assert_eq!(cfg.location_or_default(None).unwrap(), "Accra");

        let err = Config::default().location_or_default(None).unwrap_err();
        assert!(err.to_string().contains("No location given"));
    }
}
