use scraper::Html;

use super::{selector, PartialProfile, SourceParseError};

const TITLE_SUFFIX: &str = "photos and videos";

pub(super) fn extract(document: &Html, username: &str) -> Result<Option<PartialProfile>, SourceParseError> {
    let titles = selector("title")?;
    let Some(title) = document.select(&titles).next() else {
        return Ok(None);
    };

    let text: String = title.text().collect();
    Ok(display_name(&text, username).map(|name| PartialProfile {
        full_name: Some(name),
        ..PartialProfile::default()
    }))
}

/// Strips the `• Instagram photos and videos` suffix and an `(@handle)` tail.
///
/// Titles without the suffix (login walls, error pages) never yield a name.
fn display_name(title: &str, username: &str) -> Option<String> {
    let (head, tail) = title.rsplit_once('•')?;
    if !tail.trim().to_lowercase().ends_with(TITLE_SUFFIX) {
        return None;
    }

    let mut name = head.trim();
    if let Some(start) = name.rfind("(@") {
        if name.ends_with(')') {
            name = name[..start].trim_end();
        }
    }

    let bare = name.strip_prefix('@').unwrap_or(name);
    if name.is_empty() || bare == username {
        return None;
    }
    Some(name.to_string())
}
