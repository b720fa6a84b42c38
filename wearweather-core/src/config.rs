use anyhow::{Context, Result, anyhow};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{location::Coordinates, provider::ProviderId, storage::StoreLocations};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Cross-process sharing between the app and its companion display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// When false, each process keeps its own copy of every shared key.
    #[serde(default = "default_sharing_enabled")]
    pub enabled: bool,

    /// Group identifier both processes agree on.
    #[serde(default = "default_group_id")]
    pub group_id: String,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            enabled: default_sharing_enabled(),
            group_id: default_group_id(),
        }
    }
}

fn default_sharing_enabled() -> bool {
    true
}

fn default_group_id() -> String {
    "group.wearweather".to_string()
}

/// Where to ask for weather when no location update has arrived, and what to
/// call places we cannot name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,

    /// Shown until (or instead of) a reverse-geocoded name.
    pub placeholder_name: String,

    /// Name used for scenario-generated weather.
    pub mock_place_name: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 37.5665,
            longitude: 126.9780,
            placeholder_name: "My location".to_string(),
            mock_place_name: "Seoul".to_string(),
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Which side of the app/widget pair a process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    App,
    Widget,
}

impl ProcessRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessRole::App => "app",
            ProcessRole::Widget => "widget",
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, "mock" or "openweather". Unset means mock.
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub sharing: SharingConfig,

    #[serde(default)]
    pub location: LocationConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            None => Ok(ProviderId::Mock),
            Some(s) => ProviderId::try_from(s),
        }
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Candidate store directories for a process playing `role`.
    ///
    /// Never fails: a directory that cannot be determined is left out and the
    /// store falls back to the next option.
    pub fn store_locations(&self, role: ProcessRole) -> StoreLocations {
        let shared = self
            .sharing
            .enabled
            .then(BaseDirs::new)
            .flatten()
            .map(|dirs| dirs.data_dir().join("wearweather-groups").join(&self.sharing.group_id));

        let local = project_dirs()
            .ok()
            .map(|dirs| dirs.data_local_dir().join(role.as_str()));

        StoreLocations { shared, local }
    }

    /// Set/replace a provider API key and make it the default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
        self.set_default_provider(provider_id);
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.needs_api_key() || self.provider_api_key(provider_id).is_some()
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "wearweather", "wearweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
