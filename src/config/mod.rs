use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::scrapers::instagram::INSTAGRAM_BASE_URL;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub address: String,
    pub timeout: u64,
    pub user_agent: String,
    pub instagram_base_url: String,
    pub instagram_username_whitelist: Option<Vec<String>>,
    pub instagram_cookies: Option<String>,
    pub proxies: Option<Vec<String>>,
    pub proxy_cooldown_hours: u64,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub output_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
            timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            instagram_base_url: INSTAGRAM_BASE_URL.to_string(),
            instagram_username_whitelist: None,
            instagram_cookies: None,
            proxies: None,
            proxy_cooldown_hours: 4,
            delay_min_ms: 2_000,
            delay_max_ms: 4_000,
            output_dir: "profiles".to_string(),
        }
    }
}

impl AppConfig {
    pub fn is_username_allowed(&self, username: &str) -> bool {
        match &self.instagram_username_whitelist {
            Some(whitelist) => whitelist.iter().any(|allowed| allowed == username),
            None => true,
        }
    }

    pub fn proxy_cooldown(&self) -> Duration {
        Duration::from_secs(self.proxy_cooldown_hours * 3600)
    }

    pub fn delay_range(&self) -> DelayRange {
        DelayRange::from_millis(self.delay_min_ms, self.delay_max_ms)
    }

    /// Request settings for one fetch, optionally routed through `proxy`.
    pub fn fetch_config(&self, proxy: Option<String>) -> FetchConfig {
        let mut fetch = FetchConfig::new(Duration::from_secs(self.timeout))
            .with_header("User-Agent", &self.user_agent)
            .with_delay(self.delay_range());

        if let Some(cookies) = &self.instagram_cookies {
            fetch = fetch.with_header("Cookie", cookies);
        }
        if let Some(proxy) = proxy {
            fetch = fetch.with_proxy(proxy);
        }
        fetch
    }
}

/// Pause window between consecutive requests of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min.min(max)),
            max: Duration::from_millis(min.max(max)),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.max.is_zero()
    }

    /// Uniformly random duration within the range.
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Everything the transport needs for one request. Built per request, never shared.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub delay: DelayRange,
}

impl FetchConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            proxy: None,
            headers: vec![
                (
                    "Accept".to_string(),
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8".to_string(),
                ),
                ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
            ],
            timeout,
            delay: DelayRange::default(),
        }
    }

    /// Sets a header, replacing an existing one with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = delay;
        self
    }
}
