use chrono::Utc;
use log::{debug, info};
use scraper::Html;

use super::merge::merge;
use super::sources::{locate, SourceKind, SourceOutcome, SourceParseError};
use super::username::{normalize_username, ValidationError};
use crate::models::instagram::ProfileRecord;

/// Result of running the pipeline on one document: the record plus the
/// outcome of every source, kept for diagnostics.
#[derive(Debug)]
pub struct Extraction {
    pub record: ProfileRecord,
    pub outcomes: Vec<SourceOutcome>,
}

impl Extraction {
    /// Normalizes `username`, parses `html` and extracts the profile.
    ///
    /// Only username validation can fail; a page without recognizable data
    /// still produces a record carrying just the username.
    pub fn run(html: &str, username: &str) -> Result<Self, ValidationError> {
        let username = normalize_username(username)?;
        let document = Html::parse_document(html);
        Ok(Self::from_document(&document, &username))
    }

    /// Same as [`Extraction::run`] for an already parsed document.
    pub fn run_document(document: &Html, username: &str) -> Result<Self, ValidationError> {
        let username = normalize_username(username)?;
        Ok(Self::from_document(document, &username))
    }

    fn from_document(document: &Html, username: &str) -> Self {
        let outcomes = locate(document, username);
        let record = merge(username, &outcomes, Utc::now());

        if record.is_empty() {
            info!("No profile data found on page for {}", username);
        } else {
            debug!(
                "Extracted profile for {} from sources: {:?}",
                username,
                outcomes.iter().filter(|o| o.partial().is_some()).map(|o| o.kind.name()).collect::<Vec<_>>()
            );
        }

        Self { record, outcomes }
    }

    pub fn matched(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.partial().is_some())
            .map(|outcome| outcome.kind)
    }

    pub fn failures(&self) -> impl Iterator<Item = (SourceKind, &SourceParseError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.error().map(|err| (outcome.kind, err)))
    }
}

/// Extracts a [`ProfileRecord`] from raw profile HTML.
pub fn extract(html: &str, username: &str) -> Result<ProfileRecord, ValidationError> {
    Extraction::run(html, username).map(|extraction| extraction.record)
}

/// Extracts a [`ProfileRecord`] from a document parsed by the caller.
pub fn extract_document(document: &Html, username: &str) -> Result<ProfileRecord, ValidationError> {
    Extraction::run_document(document, username).map(|extraction| extraction.record)
}
