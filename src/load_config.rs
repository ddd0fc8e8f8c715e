/// `load_config` module: loads the static YAML config and applies environment overrides.
///
/// # Responsibilities
/// - Parse the YAML file into [`AppConfig`], defaulting every missing key
/// - Apply `EVENTS_API_BASE_URL` and `EVENTS_DB_PATH` from the environment (a `.env`
///   file is honoured by `main`)
/// - Validate sync tunables before anything touches the network or the store
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use events_sync_core::config::SyncSettings;
use events_sync_core::fetch::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENV_API_BASE_URL: &str = "EVENTS_API_BASE_URL";
pub const ENV_DB_PATH: &str = "EVENTS_DB_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./events.db"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiSection,
    pub store: StoreSection,
    pub sync: SyncSettings,
}

/// Reads an override; `Ok(None)` when unset, an error when set but empty.
fn env_override(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => {
            error!(var = name, "Environment override is set but empty");
            anyhow::bail!("{name} is set but empty")
        }
        Ok(value) => {
            info!(var = name, "Applying environment override");
            Ok(Some(value))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow::anyhow!("{name} could not be read: {e}")),
    }
}

/// Loads a YAML config file and merges environment overrides into it.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {path_ref:?}"))?;

    // An empty file is a valid "all defaults" config.
    let mut config: AppConfig = if content.trim().is_empty() {
        AppConfig::default()
    } else {
        match serde_yaml::from_str(&content) {
            Ok(conf) => conf,
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    if let Some(base_url) = env_override(ENV_API_BASE_URL)? {
        config.api.base_url = base_url;
    }
    if let Some(db_path) = env_override(ENV_DB_PATH)? {
        config.store.path = PathBuf::from(db_path);
    }

    config
        .sync
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid sync settings: {e}"))?;
    config.sync.trace_loaded();

    info!(
        base_url = %config.api.base_url,
        store_path = %config.store.path.display(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}
