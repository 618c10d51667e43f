use chrono::Utc;
use log::info;
use rocket::data::{Data, ToByteUnit};
use rocket::serde::json::Json;
use rocket::State;

use crate::api::ApiError;
use crate::batch::BatchRunner;
use crate::config::AppConfig;
use crate::models::instagram::{BatchRequest, BatchResponse, ExtractResponse, ProfileRecord};
use crate::proxy::ProxyManager;
use crate::scrapers::instagram::{normalize_username, Extraction, InstagramScraper, ScraperError};
use crate::storage::ProfileStore;

/// Largest HTML document accepted by the extract route.
pub const MAX_HTML_BYTES: u64 = 8 * 1024 * 1024;

fn check_whitelist(config: &AppConfig, username: &str) -> Result<(), ApiError> {
    if config.is_username_allowed(username) {
        Ok(())
    } else {
        Err(ScraperError::UnauthorizedAccess(format!("Username '{}' not allowed", username)).into())
    }
}

#[get("/<username>")]
pub async fn get_profile(
    username: &str,
    scraper: &State<InstagramScraper>,
    proxies: &State<ProxyManager>,
    config: &State<AppConfig>,
) -> Result<Json<ProfileRecord>, ApiError> {
    let username = normalize_username(username)?;
    check_whitelist(config, &username)?;

    let profile = scraper.scrape_with_rotation(&username, config, proxies).await?;
    Ok(Json(profile))
}

/// Runs the extraction pipeline on an uploaded page; no request leaves the server.
#[post("/extract?<username>", data = "<html>")]
pub async fn extract_html(username: &str, html: Data<'_>) -> Result<Json<ExtractResponse>, ApiError> {
    let body = html
        .open(MAX_HTML_BYTES.bytes())
        .into_string()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Could not read body: {}", e)))?;

    if !body.is_complete() {
        return Err(ApiError::PayloadTooLarge(MAX_HTML_BYTES));
    }

    let extraction = Extraction::run(&body, username)?;
    info!(
        "Extracted {} from uploaded page ({} sources matched)",
        extraction.record.username(),
        extraction.matched().count()
    );
    Ok(Json(extraction.into()))
}

#[post("/batch", format = "json", data = "<request>")]
pub async fn run_batch(
    request: Json<BatchRequest>,
    scraper: &State<InstagramScraper>,
    proxies: &State<ProxyManager>,
    store: &State<ProfileStore>,
    config: &State<AppConfig>,
) -> Result<Json<BatchResponse>, ApiError> {
    let request = request.into_inner();
    if request.targets.is_empty() {
        return Err(ApiError::BadRequest("No targets given".to_string()));
    }

    let mut runner = BatchRunner::new(scraper, config, proxies);
    if request.persist {
        runner = runner.persist_to(store);
    }

    let results = runner.run(&request.targets).await;
    let saved_to = if request.persist {
        let path = store.save_batch(&results, Utc::now()).await?;
        Some(path.display().to_string())
    } else {
        None
    };

    Ok(Json(BatchResponse { results, saved_to }))
}
