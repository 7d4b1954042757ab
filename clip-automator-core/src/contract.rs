//! # contract: seams between the workflows and the outside world
//!
//! Every collaborator that touches the network, the filesystem of another
//! program, or a content platform sits behind one of the traits below:
//!
//! - [`DriveClient`]: the three Drive calls the upload workflow consumes
//!   (list by query, create folder, create file with resumable media).
//! - [`CommandRunner`]: launching an external command-line tool and capturing
//!   its exit status and standard error.
//! - [`HighlightSource`]: one fetch method per content platform.
//!
//! ## Mocking & Testing
//! - Each trait is annotated for `mockall`; the generated `Mock*` types are
//!   exported under the `test-export-mocks` feature (on by default) so the CLI
//!   crate and integration tests can script deterministic backends.
//!
//! ## Errors
//! - Drive failures are split into [`DriveError::Auth`] (bad or missing
//!   service-account key, refused token exchange) and
//!   [`DriveError::Transport`] (anything the backend or network returns during
//!   list, create or upload). Neither is retried.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// MIME type Drive uses to mark a file as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A Drive `files` resource, trimmed to the fields the workflows read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Metadata for a file or folder about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDriveFile {
    pub name: String,
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl NewDriveFile {
    pub fn folder(name: &str, parent_id: &str) -> Self {
        Self {
            name: name.to_string(),
            parents: vec![parent_id.to_string()],
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        }
    }

    pub fn file(name: &str, parent_id: &str) -> Self {
        Self {
            name: name.to_string(),
            parents: vec![parent_id.to_string()],
            mime_type: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Service-account key missing or invalid, or the token endpoint refused it.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network or backend failure while listing, creating or uploading.
    #[error("drive transport failure: {0}")]
    Transport(String),

    /// Local temp-file creation or stream copy failed.
    #[error("failed to stage upload payload: {0}")]
    Staging(#[from] std::io::Error),
}

impl From<reqwest::Error> for DriveError {
    fn from(e: reqwest::Error) -> Self {
        DriveError::Transport(e.to_string())
    }
}

/// The Drive operations the upload workflow depends on.
///
/// Implemented by [`crate::google_drive::GoogleDriveClient`] and by
/// `MockDriveClient` in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Run a `files.list` query and return every match in backend order.
    async fn list_files(&self, query: &str) -> Result<Vec<DriveFile>, DriveError>;

    /// Create a folder described by `metadata`.
    async fn create_folder(&self, metadata: &NewDriveFile) -> Result<DriveFile, DriveError>;

    /// Create a file whose content is read from `local_path`, using a
    /// resumable transfer.
    async fn upload_file(
        &self,
        local_path: &Path,
        metadata: &NewDriveFile,
    ) -> Result<DriveFile, DriveError>;
}

/// Exit status and captured standard error of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Launches external command-line tools.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion. An `Err` means the process
    /// could not be launched at all.
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutcome>;
}

/// Content platforms the tool knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    YouTube,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Reddit, Platform::YouTube, Platform::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::YouTube => "youtube",
            Platform::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reddit" => Ok(Platform::Reddit),
            "youtube" => Ok(Platform::YouTube),
            "twitter" | "x" => Ok(Platform::Twitter),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// One piece of trending content found on a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub platform: Platform,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{platform} credentials are not configured")]
    MissingCredentials { platform: Platform },

    #[error("{platform} request failed: {message}")]
    Request { platform: Platform, message: String },
}

/// Reddit top-posts fetch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditFetchConfig {
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default = "default_fetch_limit")]
    pub limit: u32,
    #[serde(default = "default_time_filter")]
    pub time_filter: String,
}

/// YouTube trending fetch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouTubeFetchConfig {
    #[serde(default = "default_region_code")]
    pub region_code: String,
    #[serde(default = "default_fetch_limit")]
    pub max_results: u32,
}

/// Twitter/X search fetch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterFetchConfig {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_fetch_limit")]
    pub max_results: u32,
}

fn default_fetch_limit() -> u32 {
    25
}

fn default_time_filter() -> String {
    "week".to_string()
}

fn default_region_code() -> String {
    "US".to_string()
}

/// Per-platform content fetchers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HighlightSource: Send + Sync {
    async fn reddit_top_posts(
        &self,
        config: &RedditFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError>;

    async fn youtube_trending(
        &self,
        config: &YouTubeFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError>;

    async fn twitter_search(
        &self,
        config: &TwitterFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError>;
}

/// A URL the external downloader fetched, and where its output went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessfulDownload {
    pub url: String,
    pub output_dir: PathBuf,
}

/// A URL the external downloader failed on, with its captured error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDownload {
    pub url: String,
    pub error: String,
}

/// Result of a manual batch download, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualDownloadReport {
    pub successful_downloads: Vec<SuccessfulDownload>,
    pub failed_downloads: Vec<FailedDownload>,
    pub errors: Vec<String>,
}
