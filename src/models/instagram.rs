use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::BatchItem;
use crate::scrapers::instagram::{is_valid_username, Extraction, SourceKind, ValidationError};

/// Ordered set of outbound links. Keeps first-seen order and never holds an
/// empty string or the same string twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct BioLinks(Vec<String>);

impl BioLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the link was empty or already present.
    pub fn insert(&mut self, link: impl Into<String>) -> bool {
        let link = link.into();
        if link.is_empty() || self.0.contains(&link) {
            return false;
        }
        self.0.push(link);
        true
    }

    pub fn contains(&self, link: &str) -> bool {
        self.0.iter().any(|existing| existing == link)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for BioLinks {
    fn from(links: Vec<String>) -> Self {
        links.into_iter().collect()
    }
}

impl From<BioLinks> for Vec<String> {
    fn from(links: BioLinks) -> Self {
        links.0
    }
}

impl FromIterator<String> for BioLinks {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut links = BioLinks::new();
        for link in iter {
            links.insert(link);
        }
        links
    }
}

impl Extend<String> for BioLinks {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for link in iter {
            self.insert(link);
        }
    }
}

/// Normalized profile extracted from a single page.
///
/// Built once by the extraction pipeline and read-only afterwards. Every field
/// except `username` and `scraped_at` may be absent; the boolean flags are
/// tri-state (`None` means the page did not say).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredProfile")]
pub struct ProfileRecord {
    pub(crate) username: String,
    pub(crate) full_name: Option<String>,
    pub(crate) biography: Option<String>,
    pub(crate) follower_count: Option<u64>,
    pub(crate) following_count: Option<u64>,
    pub(crate) post_count: Option<u64>,
    pub(crate) profile_pic_url: Option<String>,
    pub(crate) external_url: Option<String>,
    pub(crate) bio_links: BioLinks,
    pub(crate) is_verified: Option<bool>,
    pub(crate) is_private: Option<bool>,
    pub(crate) is_business: Option<bool>,
    pub(crate) scraped_at: DateTime<Utc>,
    pub(crate) raw: Map<String, Value>,
}

// Wire shape of a saved record; converted through `TryFrom` so a loaded
// username is validated before it is ever joined into a path.
#[derive(Deserialize)]
struct StoredProfile {
    username: String,
    full_name: Option<String>,
    biography: Option<String>,
    follower_count: Option<u64>,
    following_count: Option<u64>,
    post_count: Option<u64>,
    profile_pic_url: Option<String>,
    external_url: Option<String>,
    #[serde(default)]
    bio_links: BioLinks,
    is_verified: Option<bool>,
    is_private: Option<bool>,
    is_business: Option<bool>,
    scraped_at: DateTime<Utc>,
    #[serde(default)]
    raw: Map<String, Value>,
}

impl TryFrom<StoredProfile> for ProfileRecord {
    type Error = ValidationError;

    fn try_from(stored: StoredProfile) -> Result<Self, Self::Error> {
        if !is_valid_username(&stored.username) {
            return Err(ValidationError::InvalidUsername(stored.username));
        }

        Ok(Self {
            username: stored.username,
            full_name: stored.full_name,
            biography: stored.biography,
            follower_count: stored.follower_count,
            following_count: stored.following_count,
            post_count: stored.post_count,
            profile_pic_url: stored.profile_pic_url,
            external_url: stored.external_url,
            bio_links: stored.bio_links,
            is_verified: stored.is_verified,
            is_private: stored.is_private,
            is_business: stored.is_business,
            scraped_at: stored.scraped_at,
            raw: stored.raw,
        })
    }
}

impl ProfileRecord {
    pub(crate) fn new(username: String, scraped_at: DateTime<Utc>) -> Self {
        Self {
            username,
            full_name: None,
            biography: None,
            follower_count: None,
            following_count: None,
            post_count: None,
            profile_pic_url: None,
            external_url: None,
            bio_links: BioLinks::new(),
            is_verified: None,
            is_private: None,
            is_business: None,
            scraped_at,
            raw: Map::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn biography(&self) -> Option<&str> {
        self.biography.as_deref()
    }

    pub fn follower_count(&self) -> Option<u64> {
        self.follower_count
    }

    pub fn following_count(&self) -> Option<u64> {
        self.following_count
    }

    pub fn post_count(&self) -> Option<u64> {
        self.post_count
    }

    pub fn profile_pic_url(&self) -> Option<&str> {
        self.profile_pic_url.as_deref()
    }

    pub fn external_url(&self) -> Option<&str> {
        self.external_url.as_deref()
    }

    pub fn bio_links(&self) -> &BioLinks {
        &self.bio_links
    }

    pub fn is_verified(&self) -> Option<bool> {
        self.is_verified
    }

    pub fn is_private(&self) -> Option<bool> {
        self.is_private
    }

    pub fn is_business(&self) -> Option<bool> {
        self.is_business
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    /// Auxiliary structured data (`graphql_user`, `json_ld`, `meta`).
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// True when no source contributed anything beyond the username.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.biography.is_none()
            && self.follower_count.is_none()
            && self.following_count.is_none()
            && self.post_count.is_none()
            && self.profile_pic_url.is_none()
            && self.external_url.is_none()
            && self.bio_links.is_empty()
            && self.is_verified.is_none()
            && self.is_private.is_none()
            && self.is_business.is_none()
            && self.raw.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Matched,
    Absent,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    pub status: SourceStatus,
    pub error: Option<String>,
}

// Response for the HTML upload endpoint: the record plus what each source did
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub data: ProfileRecord,
    pub sources: Vec<SourceReport>,
}

impl From<Extraction> for ExtractResponse {
    fn from(extraction: Extraction) -> Self {
        let sources = extraction
            .outcomes
            .iter()
            .map(|outcome| {
                let (status, error) = match &outcome.result {
                    Ok(Some(_)) => (SourceStatus::Matched, None),
                    Ok(None) => (SourceStatus::Absent, None),
                    Err(err) => (SourceStatus::Failed, Some(err.to_string())),
                };
                SourceReport {
                    source: outcome.kind,
                    status,
                    error,
                }
            })
            .collect();

        Self {
            data: extraction.record,
            sources,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub targets: Vec<String>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
    pub saved_to: Option<String>,
}
