use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::contract::{RedditFetchConfig, TwitterFetchConfig, YouTubeFetchConfig};

/// Where uploads land on Drive and how the service account is found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveSettings {
    /// Fixed parent folder the destination subfolder is resolved under.
    /// Only uploads need it; empty when the section is left out.
    #[serde(default)]
    pub parent_folder_id: String,
    #[serde(default = "default_subfolder")]
    pub subfolder: String,
    /// Service-account JSON key.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    /// Directory for staged payloads; the system temp dir when unset.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            parent_folder_id: String::new(),
            subfolder: default_subfolder(),
            credentials_file: default_credentials_file(),
            staging_dir: None,
        }
    }
}

fn default_subfolder() -> String {
    "TikTok Clips".to_string()
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("creds.json")
}

/// Batch download settings for the external downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    #[serde(default = "default_downloader")]
    pub downloader: String,
}

fn default_downloader() -> String {
    "yt-dlp".to_string()
}

/// Which platforms to fetch highlights from. Absent platforms are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighlightsConfig {
    #[serde(default)]
    pub reddit: Option<RedditFetchConfig>,
    #[serde(default)]
    pub youtube: Option<YouTubeFetchConfig>,
    #[serde(default)]
    pub twitter: Option<TwitterFetchConfig>,
}

/// Static, secret-free application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub drive: DriveSettings,
    pub download: DownloadSettings,
    #[serde(default)]
    pub highlights: HighlightsConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            parent_folder_id = %self.drive.parent_folder_id,
            subfolder = %self.drive.subfolder,
            output_dir = %self.download.output_dir.display(),
            downloader = %self.download.downloader,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

