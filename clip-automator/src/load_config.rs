/// `load_config` module: loads the static YAML config and injects platform
/// secrets from the environment.
///
/// The YAML file holds no secrets: Drive locations, download settings and
/// which platforms to fetch highlights from. API credentials come from
/// `REDDIT_*`, `YOUTUBE_*` and `TWITTER_*` variables (a `.env` file is
/// honoured by `main`), read once here and carried in [`CliConfig`].
///
/// # Errors
/// All errors use `anyhow::Error` with the file path in context and are
/// surfaced at the CLI boundary.
use anyhow::{Context, Result};
use clip_automator_core::config::Config;
use clip_automator_core::credentials::ApiCredentials;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug)]
pub struct CliConfig {
    pub app: Config,
    pub credentials: ApiCredentials,
}

/// Read and parse `path` without touching the environment.
pub fn load_static_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: Config = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.trace_loaded();
    Ok(config)
}

/// Load the static config and merge in credentials from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let app = load_static_config(path)?;
    let credentials =
        ApiCredentials::from_env().context("Failed to read platform credentials from env")?;
    Ok(CliConfig { app, credentials })
}
