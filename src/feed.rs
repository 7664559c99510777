use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use reach_sim::catalog::{parse_catalog_csv, SegmentCatalog};

const DEFAULT_FEED_PATH: &str = "data/audience.csv";
const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
enum FeedSource {
    Url(String),
    File(PathBuf),
}

struct CachedCatalog {
    catalog: SegmentCatalog,
    fetched_at: Instant,
}

/// The audience reference feed: a CSV export of the shared segment sheet,
/// fetched over HTTP or read from a local file, cached with a TTL. A
/// caller-triggered refresh bypasses the cache.
pub struct AudienceFeed {
    source: FeedSource,
    client: reqwest::Client,
    ttl: Duration,
    cache: RwLock<Option<CachedCatalog>>,
}

impl AudienceFeed {
    /// Resolution order: explicit argument, then AUDIENCE_FEED_URL, then
    /// AUDIENCE_FEED_PATH, then the default local path. Arguments starting
    /// with http(s):// are treated as remote sources.
    pub fn from_env(arg: Option<String>) -> Result<Self, String> {
        let source = if let Some(value) = arg.filter(|value| !value.trim().is_empty()) {
            parse_source(&value)
        } else if let Some(url) = non_empty_env("AUDIENCE_FEED_URL") {
            FeedSource::Url(url)
        } else if let Some(path) = non_empty_env("AUDIENCE_FEED_PATH") {
            FeedSource::File(PathBuf::from(path))
        } else {
            FeedSource::File(PathBuf::from(DEFAULT_FEED_PATH))
        };

        let ttl_secs = non_empty_env("AUDIENCE_FEED_TTL_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| format!("failed to build feed client: {}", err))?;

        Ok(Self {
            source,
            client,
            ttl: Duration::from_secs(ttl_secs),
            cache: RwLock::new(None),
        })
    }

    /// Returns the cached catalog while it is fresh; refetches on expiry.
    /// A failed refetch falls back to stale data when any exists.
    pub async fn catalog(&self) -> Result<SegmentCatalog, String> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.catalog.clone());
                }
            }
        }

        match self.refresh().await {
            Ok(catalog) => Ok(catalog),
            Err(err) => {
                let guard = self.cache.read().await;
                if let Some(cached) = guard.as_ref() {
                    tracing::warn!(error = %err, "feed refetch failed, serving stale catalog");
                    Ok(cached.catalog.clone())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Drops the cache and refetches from the source.
    pub async fn refresh(&self) -> Result<SegmentCatalog, String> {
        let text = match &self.source {
            FeedSource::Url(url) => self.fetch_remote(url).await?,
            FeedSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|err| format!("failed to read audience feed {}: {}", path.display(), err))?,
        };

        let catalog = parse_catalog_csv(&text)?;
        tracing::info!(
            segments = catalog.len(),
            regions = catalog.regions().len(),
            "audience feed refreshed"
        );

        let mut guard = self.cache.write().await;
        *guard = Some(CachedCatalog {
            catalog: catalog.clone(),
            fetched_at: Instant::now(),
        });
        Ok(catalog)
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| format!("audience feed request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("audience feed returned {}", status));
        }

        response
            .text()
            .await
            .map_err(|err| format!("failed to read audience feed body: {}", err))
    }
}

fn parse_source(value: &str) -> FeedSource {
    if value.starts_with("http://") || value.starts_with("https://") {
        FeedSource::Url(value.to_string())
    } else {
        FeedSource::File(PathBuf::from(value))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
