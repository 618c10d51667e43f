//! Sequential scraping of many profiles with polite pauses between requests.

use log::{error, info, warn};
use serde::Serialize;

use crate::config::AppConfig;
use crate::models::instagram::ProfileRecord;
use crate::proxy::ProxyManager;
use crate::scrapers::instagram::{normalize_username, InstagramScraper};
use crate::storage::ProfileStore;

/// Result for one input of a batch, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub target: String,
    pub username: Option<String>,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Parsed {
        profile: ProfileRecord,
        saved_to: Option<String>,
    },
    /// Never requested: invalid input or not whitelisted.
    Rejected { error: String },
    Failed { error: String },
}

impl BatchItem {
    pub fn profile(&self) -> Option<&ProfileRecord> {
        match &self.outcome {
            BatchOutcome::Parsed { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Parsed { .. } => None,
            BatchOutcome::Rejected { error } | BatchOutcome::Failed { error } => Some(error),
        }
    }
}

pub struct BatchRunner<'a> {
    scraper: &'a InstagramScraper,
    config: &'a AppConfig,
    proxies: &'a ProxyManager,
    store: Option<&'a ProfileStore>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(scraper: &'a InstagramScraper, config: &'a AppConfig, proxies: &'a ProxyManager) -> Self {
        Self {
            scraper,
            config,
            proxies,
            store: None,
        }
    }

    /// Saves every parsed profile to `store` as it completes.
    pub fn persist_to(mut self, store: &'a ProfileStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Scrapes `targets` one by one. A failing item never stops the batch.
    ///
    /// The pause is taken before each request that follows another request,
    /// so rejected inputs and the last item cost no waiting.
    pub async fn run(&self, targets: &[String]) -> Vec<BatchItem> {
        let delay = self.config.delay_range();
        let mut items = Vec::with_capacity(targets.len());
        let mut requested = false;

        info!("Starting batch of {} profiles", targets.len());

        for (index, target) in targets.iter().enumerate() {
            let username = match normalize_username(target) {
                Ok(username) => username,
                Err(e) => {
                    warn!("Skipping batch item {}: {}", target, e);
                    items.push(BatchItem {
                        target: target.clone(),
                        username: None,
                        outcome: BatchOutcome::Rejected { error: e.to_string() },
                    });
                    continue;
                }
            };

            if !self.config.is_username_allowed(&username) {
                warn!("Skipping batch item {}: not whitelisted", username);
                items.push(BatchItem {
                    target: target.clone(),
                    username: Some(username.clone()),
                    outcome: BatchOutcome::Rejected {
                        error: format!("Username '{}' not allowed", username),
                    },
                });
                continue;
            }

            if requested && !delay.is_zero() {
                let pause = delay.sample();
                info!("Waiting {:?} before next profile", pause);
                tokio::time::sleep(pause).await;
            }
            requested = true;

            info!("Batch {}/{}: {}", index + 1, targets.len(), username);
            let outcome = match self.scraper.scrape_with_rotation(&username, self.config, self.proxies).await {
                Ok(profile) => {
                    let saved_to = self.persist(&profile).await;
                    BatchOutcome::Parsed { profile, saved_to }
                }
                Err(e) => {
                    error!("Batch item {} failed: {}", username, e);
                    BatchOutcome::Failed { error: e.to_string() }
                }
            };

            items.push(BatchItem {
                target: target.clone(),
                username: Some(username),
                outcome,
            });
        }

        let parsed = items.iter().filter(|item| item.profile().is_some()).count();
        info!("Batch finished: {}/{} profiles parsed", parsed, items.len());
        items
    }

    async fn persist(&self, profile: &ProfileRecord) -> Option<String> {
        let store = self.store?;
        match store.save_profile(profile).await {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                error!("Could not save profile {}: {}", profile.username(), e);
                None
            }
        }
    }
}
