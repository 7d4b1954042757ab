//! Platform highlight fetchers.
//!
//! None of the platforms are wired to a real API yet: each fetcher logs that
//! it is unimplemented and returns an empty list. [`fetch_all_highlights`]
//! is the aggregation point and already isolates per-platform failures so a
//! real fetcher can be dropped in behind [`HighlightSource`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::HighlightsConfig;
use crate::contract::{
    FetchError, Highlight, HighlightSource, Platform, RedditFetchConfig, TwitterFetchConfig,
    YouTubeFetchConfig,
};

pub async fn fetch_reddit_top_posts(
    config: &RedditFetchConfig,
) -> Result<Vec<Highlight>, FetchError> {
    warn!(
        subreddits = ?config.subreddits,
        limit = config.limit,
        time_filter = %config.time_filter,
        "Reddit top-posts fetching is not implemented yet"
    );
    Ok(Vec::new())
}

pub async fn fetch_youtube_trending(
    config: &YouTubeFetchConfig,
) -> Result<Vec<Highlight>, FetchError> {
    warn!(
        region_code = %config.region_code,
        max_results = config.max_results,
        "YouTube trending fetching is not implemented yet"
    );
    Ok(Vec::new())
}

pub async fn fetch_twitter_search(
    config: &TwitterFetchConfig,
) -> Result<Vec<Highlight>, FetchError> {
    warn!(
        query = %config.query,
        max_results = config.max_results,
        "Twitter/X search fetching is not implemented yet"
    );
    Ok(Vec::new())
}

/// Stateless [`HighlightSource`] over the placeholder fetchers above.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubHighlightSource;

#[async_trait]
impl HighlightSource for StubHighlightSource {
    async fn reddit_top_posts(
        &self,
        config: &RedditFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError> {
        fetch_reddit_top_posts(config).await
    }

    async fn youtube_trending(
        &self,
        config: &YouTubeFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError> {
        fetch_youtube_trending(config).await
    }

    async fn twitter_search(
        &self,
        config: &TwitterFetchConfig,
    ) -> Result<Vec<Highlight>, FetchError> {
        fetch_twitter_search(config).await
    }
}

/// Fetch from every platform present in `config` and key the results by
/// platform. A platform whose fetch fails is logged and left with an empty
/// list; the others are unaffected.
pub async fn fetch_all_highlights<S>(
    source: &S,
    config: &HighlightsConfig,
) -> BTreeMap<Platform, Vec<Highlight>>
where
    S: HighlightSource + ?Sized,
{
    let mut results = BTreeMap::new();

    if let Some(reddit) = &config.reddit {
        let fetched = source.reddit_top_posts(reddit).await;
        results.insert(Platform::Reddit, settle(Platform::Reddit, fetched));
    }
    if let Some(youtube) = &config.youtube {
        let fetched = source.youtube_trending(youtube).await;
        results.insert(Platform::YouTube, settle(Platform::YouTube, fetched));
    }
    if let Some(twitter) = &config.twitter {
        let fetched = source.twitter_search(twitter).await;
        results.insert(Platform::Twitter, settle(Platform::Twitter, fetched));
    }

    info!(
        platforms = results.len(),
        highlights = results.values().map(Vec::len).sum::<usize>(),
        "Highlight fetch finished"
    );
    results
}

fn settle(platform: Platform, fetched: Result<Vec<Highlight>, FetchError>) -> Vec<Highlight> {
    match fetched {
        Ok(highlights) => {
            info!(%platform, count = highlights.len(), "Fetched highlights");
            highlights
        }
        Err(e) => {
            error!(%platform, error = %e, "Highlight fetch failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stubs_return_empty_lists() {
        let reddit = RedditFetchConfig {
            subreddits: vec!["videos".into(), "funny".into()],
            limit: 5,
            time_filter: "week".into(),
        };
        assert!(fetch_reddit_top_posts(&reddit).await.unwrap().is_empty());

        let youtube = YouTubeFetchConfig {
            region_code: "GB".into(),
            max_results: 50,
        };
        assert!(fetch_youtube_trending(&youtube).await.unwrap().is_empty());

        let twitter = TwitterFetchConfig {
            query: String::new(),
            max_results: 0,
        };
        assert!(fetch_twitter_search(&twitter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_configured_platforms_appear() {
        let config = HighlightsConfig {
            reddit: None,
            youtube: Some(YouTubeFetchConfig {
                region_code: "US".into(),
                max_results: 10,
            }),
            twitter: None,
        };
        let results = fetch_all_highlights(&StubHighlightSource, &config).await;
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![Platform::YouTube]);
        assert!(results[&Platform::YouTube].is_empty());
    }

    #[tokio::test]
    async fn empty_config_fetches_nothing() {
        let results =
            fetch_all_highlights(&StubHighlightSource, &HighlightsConfig::default()).await;
        assert!(results.is_empty());
    }
}
