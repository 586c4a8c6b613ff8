use crate::core::rates::RateTable;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JournalProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub journal: Option<JournalProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            journal: Some(JournalProviderConfig {
                base_url: "http://localhost:8080".to_string(),
            }),
        }
    }
}

/// The settings-managed exchange-rate table, as written in the config file.
/// Validated into a [`RateTable`] before the engine ever sees it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRatesConfig {
    pub base_currency: String,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRatesConfig {
    pub fn build(&self) -> Result<RateTable> {
        RateTable::new(&self.base_currency, self.rates.clone())
            .context("Invalid exchange_rates section in configuration")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Display currency for converted (aggregate) views.
    pub currency: String,
    /// Default account selection; empty means every account.
    #[serde(default)]
    pub accounts: Vec<i64>,
    pub exchange_rates: ExchangeRatesConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tradelens", "tradelens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
