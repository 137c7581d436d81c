use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "hourspin";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory for persisted stats, `$HOME/.local/state/hourspin` when HOME is set
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn stats_json_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("stats.json"))
    }

    pub fn stats_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("stats.db"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}
