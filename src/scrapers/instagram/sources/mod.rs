//! Extraction strategies, one per place a profile page can carry data.
//!
//! Every strategy looks at the parsed document on its own and reports a
//! [`SourceOutcome`]. A strategy that fails never stops the others; the merge
//! step decides what to keep using [`SourceKind::PRIORITY`].

use log::debug;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::counts::parse_count;

mod anchors;
mod embedded;
mod json_ld;
mod meta;
mod title;

pub(crate) use anchors::external_link;

/// Registrable domain of the scraped site; links on it are never bio links.
pub const SITE_DOMAIN: &str = "instagram.com";

#[derive(Error, Debug)]
pub enum SourceParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unbalanced JSON object in script ({0} bytes)")]
    Unbalanced(usize),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    EmbeddedJson,
    JsonLd,
    MetaTags,
    PageTitle,
    AnchorScan,
}

impl SourceKind {
    /// Earlier entries win when two sources report the same field.
    pub const PRIORITY: [SourceKind; 5] = [
        SourceKind::EmbeddedJson,
        SourceKind::JsonLd,
        SourceKind::MetaTags,
        SourceKind::PageTitle,
        SourceKind::AnchorScan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::EmbeddedJson => "embedded_json",
            SourceKind::JsonLd => "json_ld",
            SourceKind::MetaTags => "meta_tags",
            SourceKind::PageTitle => "page_title",
            SourceKind::AnchorScan => "anchor_scan",
        }
    }

    fn attempt(self, document: &Html, username: &str) -> Result<Option<PartialProfile>, SourceParseError> {
        match self {
            SourceKind::EmbeddedJson => embedded::extract(document),
            SourceKind::JsonLd => json_ld::extract(document),
            SourceKind::MetaTags => meta::extract(document, username),
            SourceKind::PageTitle => title::extract(document, username),
            SourceKind::AnchorScan => anchors::extract(document),
        }
    }
}

/// Fields one source could find. Absent fields are simply `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialProfile {
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub follower_count: Option<u64>,
    pub following_count: Option<u64>,
    pub post_count: Option<u64>,
    pub profile_pic_url: Option<String>,
    pub external_url: Option<String>,
    pub is_verified: Option<bool>,
    pub is_private: Option<bool>,
    pub is_business: Option<bool>,
    pub links: Vec<String>,
    pub raw: Map<String, Value>,
}

impl PartialProfile {
    pub fn is_empty(&self) -> bool {
        *self == PartialProfile::default()
    }
}

/// What a single strategy produced: data, nothing, or a parse failure.
#[derive(Debug)]
pub struct SourceOutcome {
    pub kind: SourceKind,
    pub result: Result<Option<PartialProfile>, SourceParseError>,
}

impl SourceOutcome {
    pub fn partial(&self) -> Option<&PartialProfile> {
        self.result.as_ref().ok().and_then(Option::as_ref)
    }

    pub fn error(&self) -> Option<&SourceParseError> {
        self.result.as_ref().err()
    }
}

/// Runs every strategy against `document` in priority order.
pub fn locate(document: &Html, username: &str) -> Vec<SourceOutcome> {
    SourceKind::PRIORITY
        .iter()
        .map(|&kind| {
            let result = kind
                .attempt(document, username)
                .map(|partial| partial.filter(|p| !p.is_empty()));

            match &result {
                Ok(Some(_)) => debug!("Source {} matched for {}", kind.name(), username),
                Ok(None) => debug!("Source {} absent for {}", kind.name(), username),
                Err(e) => debug!("Source {} failed for {}: {}", kind.name(), username, e),
            }

            SourceOutcome { kind, result }
        })
        .collect()
}

pub(crate) fn selector(css: &str) -> Result<Selector, SourceParseError> {
    Selector::parse(css).map_err(|e| SourceParseError::Selector(format!("{css}: {e}")))
}

pub(crate) fn is_site_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == SITE_DOMAIN || host.ends_with(&format!(".{SITE_DOMAIN}"))
}

// Trimmed, non-empty string value.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

// Counts show up as integers in GraphQL payloads and as "1.2K"-style strings elsewhere.
fn count_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}
