/// Image search client: the single point of entry for remote photo lookups.
///
/// Only the image resolver talks to this module. Every failure mode (transport,
/// timeout, non-200, bad JSON, empty result set) is reported as an
/// `ImageSearchError` so the resolver can treat it as a cache miss.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
/// Hard ceiling on a single lookup. Foreground requests block on this at most.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const PER_PAGE: u32 = 10;
const ORIENTATION: &str = "landscape";
const USER_AGENT: &str = "EcoFinds-Marketplace/1.0";

#[derive(Debug, Error)]
pub enum ImageSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status})")]
    Api { status: u16 },

    #[error("Search returned no results")]
    NoResults,
}

/// A remote source of candidate image URLs for a free-text query.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>, ImageSearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Unsplash-compatible photo search over HTTP.
#[derive(Clone)]
pub struct UnsplashClient {
    client: Client,
    base_url: String,
    access_key: String,
}

impl UnsplashClient {
    pub fn new(base_url: String, access_key: String) -> Result<Self, ImageSearchError> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            access_key,
        })
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(&self, query: &str) -> Result<Vec<String>, ImageSearchError> {
        let per_page = PER_PAGE.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", ORIENTATION),
                ("client_id", self.access_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ImageSearchError::Api {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response.json().await?;
        let urls: Vec<String> = body
            .results
            .into_iter()
            .map(|r| r.urls.regular)
            .filter(|u| !u.is_empty())
            .collect();

        debug!("Image search for '{query}' returned {} candidates", urls.len());

        if urls.is_empty() {
            return Err(ImageSearchError::NoResults);
        }
        Ok(urls)
    }
}
