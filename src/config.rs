use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::countdown::ONE_HOUR_SECS;
use crate::error::{ConfigError, StoreError};
use crate::store::{FileStatsStore, SqliteStatsStore, StatsStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Settling time between drawing an hour and committing it.
    pub resolution_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub hour_secs: u32,
    pub stats_backend: StatsBackend,
    /// Overrides the platform state directory.
    pub stats_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution_delay_ms: 1000,
            tick_interval_ms: 1000,
            hour_secs: ONE_HOUR_SECS,
            stats_backend: StatsBackend::Json,
            stats_path: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "tick_interval_ms",
            });
        }
        if self.hour_secs == 0 {
            return Err(ConfigError::ZeroDuration { field: "hour_secs" });
        }
        Ok(())
    }

    pub fn resolution_delay(&self) -> Duration {
        Duration::from_millis(self.resolution_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Build the configured stats backend.
    pub fn open_store(&self) -> Result<Box<dyn StatsStore>, StoreError> {
        let store: Box<dyn StatsStore> = match (self.stats_backend, &self.stats_path) {
            (StatsBackend::Json, Some(path)) => Box::new(FileStatsStore::with_path(path)),
            (StatsBackend::Json, None) => Box::new(FileStatsStore::new()),
            (StatsBackend::Sqlite, Some(path)) => Box::new(SqliteStatsStore::open(path)?),
            (StatsBackend::Sqlite, None) => Box::new(SqliteStatsStore::open_default()?),
        };
        Ok(store)
    }
}

pub trait ConfigStore {
    fn load(&self) -> EngineConfig;
    fn save(&self, cfg: &EngineConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("hourspin_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> EngineConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<EngineConfig>(&bytes) {
                Ok(cfg) if cfg.validate().is_ok() => return cfg,
                Ok(_) => {
                    tracing::warn!(path = ?self.path, "config has invalid values, using defaults")
                }
                Err(err) => {
                    tracing::warn!(path = ?self.path, error = %err, "failed to parse config")
                }
            }
        }
        EngineConfig::default()
    }

    fn save(&self, cfg: &EngineConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
