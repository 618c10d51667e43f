use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use parking_lot::Mutex;
use rand::seq::SliceRandom;

const SCHEMES: [&str; 4] = ["http://", "https://", "socks5://", "socks://"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    fn scheme(self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http://",
            ProxyProtocol::Https => "https://",
            ProxyProtocol::Socks5 => "socks5://",
        }
    }

    /// Guesses the protocol from the scheme, then from well-known ports.
    fn detect(proxy_url: &str) -> Self {
        if proxy_url.starts_with("https://") {
            ProxyProtocol::Https
        } else if proxy_url.starts_with("socks5://") || proxy_url.starts_with("socks://") {
            ProxyProtocol::Socks5
        } else if proxy_url.starts_with("http://") {
            ProxyProtocol::Http
        } else if proxy_url.ends_with(":1080") || proxy_url.ends_with(":9050") {
            ProxyProtocol::Socks5
        } else if proxy_url.ends_with(":443") {
            ProxyProtocol::Https
        } else {
            ProxyProtocol::Http
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyStatus {
    pub available: bool,
    pub last_failure: Option<Instant>,
    pub protocol: ProxyProtocol,
}

/// Shared pool of outbound proxies. Failed proxies sit out for `cooldown`.
#[derive(Debug, Clone)]
pub struct ProxyManager {
    proxies: Arc<Mutex<HashMap<String, ProxyStatus>>>,
    cooldown: Duration,
}

impl ProxyManager {
    pub fn new(proxy_list: Option<Vec<String>>, cooldown: Duration) -> Self {
        let proxies = proxy_list
            .unwrap_or_default()
            .into_iter()
            .map(|proxy| proxy.trim().to_string())
            .filter(|proxy| !proxy.is_empty())
            .map(|proxy| {
                let status = ProxyStatus {
                    available: true,
                    last_failure: None,
                    protocol: ProxyProtocol::detect(&proxy),
                };
                (proxy, status)
            })
            .collect();

        let manager = ProxyManager {
            proxies: Arc::new(Mutex::new(proxies)),
            cooldown,
        };
        manager.log_proxy_list();
        manager
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.lock().is_empty()
    }

    pub fn get_random_proxy(&self) -> Option<String> {
        let mut proxies = self.proxies.lock();

        for status in proxies.values_mut() {
            let recovered = status
                .last_failure
                .map_or(false, |failed_at| failed_at.elapsed() >= self.cooldown);
            if !status.available && recovered {
                status.available = true;
                status.last_failure = None;
            }
        }

        let available: Vec<&String> = proxies
            .iter()
            .filter(|(_, status)| status.available)
            .map(|(proxy, _)| proxy)
            .collect();

        available.choose(&mut rand::thread_rng()).map(|proxy| proxy.to_string())
    }

    pub fn mark_proxy_unavailable(&self, proxy: &str) {
        if let Some(status) = self.proxies.lock().get_mut(proxy) {
            status.available = false;
            status.last_failure = Some(Instant::now());
        }
    }

    /// `(available, total)`
    pub fn get_proxy_count(&self) -> (usize, usize) {
        let proxies = self.proxies.lock();
        let available = proxies.values().filter(|status| status.available).count();
        (available, proxies.len())
    }

    /// Prefixes a scheme-less proxy with the detected protocol.
    pub fn normalize_proxy_url(&self, proxy_url: &str) -> String {
        if SCHEMES.iter().any(|scheme| proxy_url.starts_with(scheme)) {
            return proxy_url.to_string();
        }

        let protocol = self
            .proxies
            .lock()
            .get(proxy_url)
            .map(|status| status.protocol)
            .unwrap_or_else(|| ProxyProtocol::detect(proxy_url));
        format!("{}{}", protocol.scheme(), proxy_url)
    }

    fn log_proxy_list(&self) {
        let proxies = self.proxies.lock();
        if proxies.is_empty() {
            info!("No proxies configured");
            return;
        }

        for (url, status) in proxies.iter() {
            info!("Proxy: {} (detected protocol: {:?})", url, status.protocol);
            if !SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
                warn!("Proxy {} has no scheme, using {:?}", url, status.protocol);
            }
        }
    }
}
