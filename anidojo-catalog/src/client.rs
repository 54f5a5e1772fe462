//! Catalog API client
//!
//! Queries the public anime catalog API for search results, single records,
//! and the current season, with pagination. The catalog is rate limited, so
//! the client enforces a fixed minimum interval between requests.
//!
//! Every failure mode — transport error, non-success HTTP status (including
//! rate limiting), unparsable body — surfaces as `CatalogUnavailable`. The
//! catalog is read-only: nothing here can affect the core's own persisted
//! state.

use std::sync::Arc;
use std::time::Duration;

use anidojo_common::models::AnimeSummary;
use anidojo_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::normalizer::{normalize, RawAnime};

/// Catalog API base URL
const CATALOG_API_URL: &str = "https://api.jikan.moe/v4";

/// Default timeout for catalog API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum interval between requests (the public catalog allows ~3 req/sec)
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(400);

/// One page of normalized catalog results plus pagination metadata
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub items: Vec<AnimeSummary>,
    pub has_next_page: bool,
    pub current_page: i64,
}

/// Raw paginated response envelope
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    data: Vec<RawAnime>,
    pagination: Option<RawPagination>,
}

#[derive(Debug, Deserialize)]
struct RawPagination {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default = "default_page")]
    current_page: i64,
}

fn default_page() -> i64 {
    1
}

/// Raw single-record response envelope
#[derive(Debug, Deserialize)]
struct RawSingle {
    data: RawAnime,
}

/// Catalog API client
///
/// Shared `reqwest::Client` with a request timeout and a fixed-interval rate
/// limiter. Cloneable via `Arc` internals; one instance per application is
/// enough.
#[derive(Clone)]
pub struct CatalogClient {
    http_client: Client,
    base_url: String,
    /// Last request time, for rate limiting
    rate_limiter: Arc<Mutex<Option<Instant>>>,
}

impl CatalogClient {
    /// Client against the public catalog API
    pub fn new() -> Result<Self> {
        Self::with_base_url(CATALOG_API_URL)
    }

    /// Client against an alternate base URL (tests, mirrors)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::CatalogUnavailable(format!("failed to build client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(Mutex::new(None)),
        })
    }

    /// Free-text search, paginated
    pub async fn search(&self, query: &str, page: i64, limit: i64) -> Result<CatalogPage> {
        let url = format!("{}/anime", self.base_url);
        self.fetch_page(
            &url,
            &[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Single record by catalog id
    pub async fn by_id(&self, id: i64) -> Result<AnimeSummary> {
        let url = format!("{}/anime/{}", self.base_url, id);
        debug!(%url, "catalog request");

        self.enforce_rate_limit().await;
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::CatalogUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CatalogUnavailable(format!(
                "catalog returned HTTP {}",
                response.status()
            )));
        }

        let single: RawSingle = response
            .json()
            .await
            .map_err(|e| Error::CatalogUnavailable(format!("unparsable response: {}", e)))?;

        Ok(normalize(&single.data))
    }

    /// Currently airing season, paginated
    pub async fn current_season(&self, page: i64, limit: i64) -> Result<CatalogPage> {
        let url = format!("{}/seasons/now", self.base_url);
        self.fetch_page(
            &url,
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Fetch and normalize one paginated result page
    async fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<CatalogPage> {
        debug!(%url, "catalog request");

        self.enforce_rate_limit().await;
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::CatalogUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CatalogUnavailable(format!(
                "catalog returned HTTP {}",
                response.status()
            )));
        }

        let raw: RawPage = response
            .json()
            .await
            .map_err(|e| Error::CatalogUnavailable(format!("unparsable response: {}", e)))?;

        let (has_next_page, current_page) = raw
            .pagination
            .map(|p| (p.has_next_page, p.current_page))
            .unwrap_or((false, 1));

        Ok(CatalogPage {
            items: raw.data.iter().map(normalize).collect(),
            has_next_page,
            current_page,
        })
    }

    /// Sleep as needed to keep the minimum interval between requests
    async fn enforce_rate_limit(&self) {
        let mut last_request = self.rate_limiter.lock().await;

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                let sleep_duration = RATE_LIMIT_INTERVAL - elapsed;
                debug!(
                    sleep_ms = sleep_duration.as_millis(),
                    "rate limiting catalog request"
                );
                sleep(sleep_duration).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}
