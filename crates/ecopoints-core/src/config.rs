use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::impact::DEFAULT_CO2_KG_PER_KG;

/// Name of the per-project data directory.
pub const DATA_DIR: &str = ".ecopoints";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub impact: ImpactConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Fail `eco verify` when any user's redemptions exceed their earnings.
    #[serde(default = "default_true")]
    pub fail_on_deficit: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            fail_on_deficit: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    #[serde(default = "default_co2_kg_per_kg")]
    pub co2_kg_per_kg: f64,
    #[serde(default = "default_impact_window")]
    pub window: u32,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            co2_kg_per_kg: default_co2_kg_per_kg(),
            window: default_impact_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Identity key used when neither `--user` nor `ECO_USER` is set.
    #[serde(default)]
    pub default_user: Option<String>,
}

/// Project and user configuration, loaded together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
}

/// Path of the data directory under a project root.
#[must_use]
pub fn data_dir(project_root: &Path) -> PathBuf {
    project_root.join(DATA_DIR)
}

/// Load `.ecopoints/config.toml` under `project_root`, or defaults when the
/// file is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = data_dir(project_root).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    load_user_config_from(&config_dir.join("ecopoints/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the project config under `project_root` and the per-user config.
///
/// # Errors
///
/// Returns an error if either file exists but cannot be read or parsed.
pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;
    Ok(EffectiveConfig { project, user })
}

const fn default_true() -> bool {
    true
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_co2_kg_per_kg() -> f64 {
    DEFAULT_CO2_KG_PER_KG
}

const fn default_impact_window() -> u32 {
    100
}
