//! Per-platform API credentials and their offline presence check.
//!
//! Credentials are read from the environment once, at startup, and passed to
//! whoever needs them. An empty string means "absent".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::Platform;

/// `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USER_AGENT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// `YOUTUBE_API_KEY`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeCredentials {
    pub api_key: String,
}

/// `TWITTER_API_KEY`, `TWITTER_API_SECRET`, `TWITTER_ACCESS_TOKEN`,
/// `TWITTER_ACCESS_TOKEN_SECRET`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiCredentials {
    pub reddit: RedditCredentials,
    pub youtube: YouTubeCredentials,
    pub twitter: TwitterCredentials,
}

impl ApiCredentials {
    pub fn from_env() -> Result<Self, envy::Error> {
        let credentials = Self {
            reddit: envy::prefixed("REDDIT_").from_env()?,
            youtube: envy::prefixed("YOUTUBE_").from_env()?,
            twitter: envy::prefixed("TWITTER_").from_env()?,
        };
        debug!(
            reddit = credentials.validate_api_credentials(Platform::Reddit),
            youtube = credentials.validate_api_credentials(Platform::YouTube),
            twitter = credentials.validate_api_credentials(Platform::Twitter),
            "Read platform credentials from environment"
        );
        Ok(credentials)
    }

    /// True only when every value the platform requires is non-empty.
    /// Reddit's user agent is optional.
    pub fn validate_api_credentials(&self, platform: Platform) -> bool {
        let required: Vec<&str> = match platform {
            Platform::Reddit => vec![
                self.reddit.client_id.as_str(),
                self.reddit.client_secret.as_str(),
            ],
            Platform::YouTube => vec![self.youtube.api_key.as_str()],
            Platform::Twitter => vec![
                self.twitter.api_key.as_str(),
                self.twitter.api_secret.as_str(),
                self.twitter.access_token.as_str(),
                self.twitter.access_token_secret.as_str(),
            ],
        };
        required.iter().all(|value| !value.is_empty())
    }

    pub fn validation_report(&self) -> BTreeMap<Platform, bool> {
        let report: BTreeMap<Platform, bool> = Platform::ALL
            .iter()
            .map(|p| (*p, self.validate_api_credentials(*p)))
            .collect();
        info!(?report, "Validated platform credentials");
        report
    }
}
