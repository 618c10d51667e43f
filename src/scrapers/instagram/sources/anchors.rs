use scraper::Html;
use url::Url;

use super::{is_site_host, selector, PartialProfile, SourceParseError};
use crate::models::instagram::BioLinks;

// Instagram wraps outbound links as https://l.instagram.com/?u=<target>
const LINK_SHIM_HOST: &str = "l.instagram.com";

pub(super) fn extract(document: &Html) -> Result<Option<PartialProfile>, SourceParseError> {
    let anchors = selector("a[href]")?;
    let mut links = BioLinks::new();

    for anchor in document.select(&anchors) {
        if let Some(link) = anchor.value().attr("href").and_then(external_link) {
            links.insert(link);
        }
    }

    if links.is_empty() {
        return Ok(None);
    }

    Ok(Some(PartialProfile {
        links: links.into(),
        ..PartialProfile::default()
    }))
}

/// Off-site `http(s)` link with query string and fragment removed.
/// Link shims are unwrapped first; on-site and non-http links give `None`.
pub(crate) fn external_link(href: &str) -> Option<String> {
    let href = href.trim();
    if !href.starts_with("http") {
        return None;
    }

    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    if host.eq_ignore_ascii_case(LINK_SHIM_HOST) {
        let target = url.query_pairs().find(|(key, _)| key == "u").map(|(_, value)| value.into_owned())?;
        return external_link(&target);
    }
    if is_site_host(host) {
        return None;
    }

    let end = href.find(['?', '#']).unwrap_or(href.len());
    Some(href[..end].to_string())
}
