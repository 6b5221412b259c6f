//! Hub configuration.
//!
//! Config file: `$HUB_CONFIG` or `~/.config/hub/config.toml`. Every field has
//! a default, so a partial or missing file is fine.

use hub_shared::{HubError, LevelPolicy, LevelTier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV: &str = "HUB_CONFIG";

/// Where the current quarter week comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekSource {
    /// `get_current_quarter_week`, with the local formula as fallback
    #[default]
    Remote,
    /// Local formula only
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { snapshot_path: default_snapshot_path() }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("hub-data.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_blob_root")]
    pub root: PathBuf,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self { root: default_blob_root(), bucket: default_bucket() }
    }
}

fn default_blob_root() -> PathBuf {
    PathBuf::from("hub-blobs")
}

fn default_bucket() -> String {
    "company-resources".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    #[serde(default)]
    pub week_source: WeekSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    /// Empty means the built-in tiers
    #[serde(default)]
    pub tiers: Vec<LevelTier>,
}

impl LevelSettings {
    pub fn policy(&self) -> Result<LevelPolicy, HubError> {
        if self.tiers.is_empty() {
            Ok(LevelPolicy::default())
        } else {
            LevelPolicy::new(self.tiers.clone())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub blob: BlobConfig,
    #[serde(default)]
    pub kpi: KpiConfig,
    #[serde(default)]
    pub levels: LevelSettings,
    #[serde(default)]
    pub session: SessionConfig,
}

impl HubConfig {
    /// `~/.config/hub/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hub").join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, HubError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: HubConfig = toml::from_str(&contents)
            .map_err(|e| HubError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.levels.policy()?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// First existing path among the explicit one, `$HUB_CONFIG` and the user config
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            if !env_path.is_empty() {
                return Some(PathBuf::from(env_path));
            }
        }
        Self::user_config_path().filter(|p| p.exists())
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (`--config`)
    /// 2. `$HUB_CONFIG`
    /// 3. User config
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, HubError> {
        match Self::discover(explicit) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), HubError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| HubError::Config(format!("Failed to serialize configuration: {}", e)))?;
        fs::write(path, toml_string)?;
        Ok(())
    }
}
