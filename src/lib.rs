//! Instagram profile extraction: username normalization, multi-source HTML
//! extraction, count parsing and a Rocket API around it.

#[macro_use]
extern crate rocket;

pub mod api;
pub mod batch;
pub mod config;
pub mod cors;
pub mod models;
pub mod proxy;
pub mod scrapers;
pub mod storage;

use log::info;
use rocket::figment::Figment;
use rocket::{Build, Rocket};

pub use config::{AppConfig, DelayRange, FetchConfig};
pub use models::instagram::{BioLinks, ProfileRecord};
pub use scrapers::instagram::{
    extract, extract_document, normalize_username, parse_count, Extraction, InstagramScraper, ScraperError,
    SourceKind, SourceOutcome, ValidationError,
};

use cors::CORS;
use proxy::ProxyManager;
use storage::ProfileStore;

/// Assembles the server: managed state, CORS and the `/instagram` routes.
pub fn build_rocket(figment: Figment, config: AppConfig) -> Rocket<Build> {
    let proxy_manager = ProxyManager::new(config.proxies.clone(), config.proxy_cooldown());
    let (available, total) = proxy_manager.get_proxy_count();
    if total > 0 {
        info!("Proxy rotation enabled with {}/{} available proxies", available, total);
    } else {
        info!("Proxy rotation disabled - no proxies configured");
    }

    let scraper = InstagramScraper::from_config(&config);
    let store = ProfileStore::new(&config.output_dir);
    info!("Profiles will be saved under {}", store.root().display());

    rocket::custom(figment)
        .attach(CORS)
        .manage(scraper)
        .manage(proxy_manager)
        .manage(store)
        .manage(config)
        .mount(
            "/instagram",
            routes![
                api::instagram::get_profile,
                api::instagram::extract_html,
                api::instagram::run_batch,
            ],
        )
}
