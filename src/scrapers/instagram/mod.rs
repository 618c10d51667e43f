use std::time::Duration;

use log::{error, info, warn};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::{AppConfig, FetchConfig};
use crate::models::instagram::ProfileRecord;
use crate::proxy::ProxyManager;

mod counts;
mod extract;
mod json_blob;
mod merge;
mod sources;
mod username;

pub use counts::parse_count;
pub use extract::{extract, extract_document, Extraction};
pub use json_blob::first_json_object;
pub use merge::{decode_entities, merge};
pub use sources::{locate, PartialProfile, SourceKind, SourceOutcome, SourceParseError, SITE_DOMAIN};
pub use username::{
    is_valid_username, normalize_username, profile_url, ValidationError, INSTAGRAM_BASE_URL, MAX_USERNAME_LEN,
};

const MAX_PROXY_ATTEMPTS: usize = 3;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("Rate limited or blocked")]
    RateLimited,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Proxy error: {0}")]
    ProxyError(String),

    #[error("All proxies failed")]
    AllProxiesFailed,

    #[error("Unauthorized: {0}")]
    UnauthorizedAccess(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ScraperError {
    /// Failures worth retrying through another proxy.
    fn is_proxy_failure(&self) -> bool {
        matches!(
            self,
            ScraperError::ProxyError(_) | ScraperError::Timeout(_) | ScraperError::NetworkError(_)
        )
    }
}

/// Fetches profile pages and runs them through the extraction pipeline.
///
/// Holds no client: every request builds its own from a [`FetchConfig`], so
/// proxy and header choices never leak between requests.
#[derive(Debug, Clone)]
pub struct InstagramScraper {
    base_url: String,
}

impl Default for InstagramScraper {
    fn default() -> Self {
        Self::new(INSTAGRAM_BASE_URL)
    }
}

impl InstagramScraper {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.instagram_base_url.as_str())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_client(fetch: &FetchConfig) -> Result<Client, ScraperError> {
        let mut builder = Client::builder().timeout(fetch.timeout);

        if let Some(proxy_url) = &fetch.proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| ScraperError::ProxyError(format!("Invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }

    /// Downloads the profile page for `input` (handle or profile URL).
    ///
    /// Validation happens before any request is made.
    pub async fn fetch_html(&self, input: &str, fetch: &FetchConfig) -> Result<String, ScraperError> {
        let username = normalize_username(input)?;
        let url = profile_url(&self.base_url, &username);
        let client = Self::build_client(fetch)?;

        info!("Fetching Instagram profile page: {}", url);

        let mut request = client.get(&url);
        for (name, value) in &fetch.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| classify(e, fetch))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            error!("Profile not found: {}", username);
            return Err(ScraperError::ProfileNotFound);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            error!("Rate limited by Instagram while fetching {}", username);
            return Err(ScraperError::RateLimited);
        }

        if !status.is_success() {
            error!("Failed to fetch profile {}, status: {}", username, status);
            return Err(ScraperError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(|e| classify(e, fetch))
    }

    /// Fetches and extracts one profile.
    pub async fn scrape_profile(&self, input: &str, fetch: &FetchConfig) -> Result<ProfileRecord, ScraperError> {
        let username = normalize_username(input)?;
        let html = self.fetch_html(&username, fetch).await?;
        Ok(extract(&html, &username)?)
    }

    /// Like [`InstagramScraper::scrape_profile`], routed through the proxy pool
    /// when one is configured. Proxies that fail are benched and another is tried.
    pub async fn scrape_with_rotation(
        &self,
        input: &str,
        config: &AppConfig,
        proxies: &ProxyManager,
    ) -> Result<ProfileRecord, ScraperError> {
        let username = normalize_username(input)?;

        if proxies.is_empty() {
            return self.scrape_profile(&username, &config.fetch_config(None)).await;
        }

        for attempt in 1..=MAX_PROXY_ATTEMPTS {
            let Some(proxy) = proxies.get_random_proxy() else {
                break;
            };

            let fetch = config.fetch_config(Some(proxies.normalize_proxy_url(&proxy)));
            match self.scrape_profile(&username, &fetch).await {
                Err(e) if e.is_proxy_failure() => {
                    warn!(
                        "Attempt {}/{} for {} failed through proxy {}: {}",
                        attempt, MAX_PROXY_ATTEMPTS, username, proxy, e
                    );
                    proxies.mark_proxy_unavailable(&proxy);
                }
                other => return other,
            }
        }

        error!("No working proxy left for {}", username);
        Err(ScraperError::AllProxiesFailed)
    }
}

fn classify(error: reqwest::Error, fetch: &FetchConfig) -> ScraperError {
    if error.is_timeout() {
        return ScraperError::Timeout(fetch.timeout);
    }
    if error.is_connect() {
        if let Some(proxy) = &fetch.proxy {
            return ScraperError::ProxyError(format!("Could not connect through {}: {}", proxy, error));
        }
    }
    ScraperError::NetworkError(error)
}
