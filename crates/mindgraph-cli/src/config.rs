//! Configuration loading.

use mindgraph_types::config::MindGraphConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that overrides `db_path`.
pub const DB_PATH_ENV: &str = "MINDGRAPH_DB_PATH";

/// `~/.mindgraph/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".mindgraph"))
        .unwrap_or_else(|| PathBuf::from(".mindgraph"))
        .join("config.toml")
}

/// Load configuration from disk, falling back to defaults.
///
/// A missing file is normal. An unreadable or malformed file is logged and
/// replaced by defaults so read-only commands keep working.
pub fn load_config(path: Option<&Path>) -> MindGraphConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    let config = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<MindGraphConfig>(&contents) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        path = %config_path.display(),
                        "Failed to parse config, using defaults"
                    );
                    MindGraphConfig::default()
                }
            },
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to read config file, using defaults"
                );
                MindGraphConfig::default()
            }
        }
    } else {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        MindGraphConfig::default()
    };

    apply_db_override(config, std::env::var(DB_PATH_ENV).ok())
}

fn apply_db_override(mut config: MindGraphConfig, db_path: Option<String>) -> MindGraphConfig {
    if let Some(p) = db_path.filter(|p| !p.trim().is_empty()) {
        config.db_path = PathBuf::from(p);
    }
    config
}
