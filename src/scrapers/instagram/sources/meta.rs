use regex::Regex;
use scraper::Html;
use serde_json::{Map, Value};

use super::{selector, PartialProfile, SourceParseError};
use crate::scrapers::instagram::counts::parse_count;

/// `property`/`name` attribute → key under `raw.meta`.
const META_MAP: [(&str, &str); 5] = [
    ("og:title", "og_title"),
    ("og:description", "og_description"),
    ("og:image", "profile_pic_url"),
    ("og:url", "canonical_url"),
    ("description", "meta_description"),
];

// "142M Followers, 3,512 Following, 582 Posts"
const STATS_PATTERN: &str = r"(?i)([\d.,·]+[KMB]?)\s+Followers?\s*[,·]\s*([\d.,·]+[KMB]?)\s+Following\s*[,·]\s*([\d.,·]+[KMB]?)\s+Posts?";

// `... - Drake (@champagnepapi) on Instagram: "bio"`
const BIO_PATTERN: &str = r#"(?s)on Instagram:\s*"(.*)""#;

// "Drake (@champagnepapi) • Instagram photos and videos"
const TITLE_PATTERN: &str = r"^\s*(.*?)\s*\(@([A-Za-z0-9._]{1,30})\)";

pub(super) fn extract(document: &Html, username: &str) -> Result<Option<PartialProfile>, SourceParseError> {
    let metas = selector("meta")?;
    let mut collected = Map::new();

    for meta in document.select(&metas) {
        let element = meta.value();
        let Some(key) = element.attr("property").or_else(|| element.attr("name")) else {
            continue;
        };
        let Some(&(_, field)) = META_MAP.iter().find(|(tag, _)| *tag == key) else {
            continue;
        };
        let content = element.attr("content").unwrap_or("").trim();
        if content.is_empty() || collected.contains_key(field) {
            continue;
        }
        collected.insert(field.to_string(), Value::String(content.to_string()));
    }

    if collected.is_empty() {
        return Ok(None);
    }

    let text = |key: &str| collected.get(key).and_then(Value::as_str).map(str::to_string);
    let descriptions: Vec<String> = ["og_description", "meta_description"]
        .into_iter()
        .filter_map(text)
        .collect();
    let og_title = text("og_title");

    let mut partial = PartialProfile {
        profile_pic_url: text("profile_pic_url"),
        ..PartialProfile::default()
    };

    let stats_re = Regex::new(STATS_PATTERN)?;
    if let Some(caps) = descriptions.iter().find_map(|d| stats_re.captures(d)) {
        partial.follower_count = parse_count(&caps[1]);
        partial.following_count = parse_count(&caps[2]);
        partial.post_count = parse_count(&caps[3]);
    }

    let bio_re = Regex::new(BIO_PATTERN)?;
    partial.biography = descriptions
        .iter()
        .find_map(|d| bio_re.captures(d))
        .map(|caps| caps[1].trim().to_string())
        .filter(|bio| !bio.is_empty());

    if let Some(title) = og_title {
        partial.full_name = title_name(&title, username)?;
    }

    partial.raw.insert("meta".to_string(), Value::Object(collected));
    Ok(Some(partial))
}

/// Display name from an `og:title` like `Full Name (@handle) ...`.
fn title_name(title: &str, username: &str) -> Result<Option<String>, SourceParseError> {
    let title_re = Regex::new(TITLE_PATTERN)?;
    let Some(caps) = title_re.captures(title) else {
        return Ok(None);
    };

    let name = caps[1].trim();
    let handle = &caps[2];
    if name.is_empty() || !handle.eq_ignore_ascii_case(username) || name == username {
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str) -> Html {
        Html::parse_document(&format!("<html><head>{head}</head><body></body></html>"))
    }

    #[test]
    fn parses_stats_bio_and_title() {
        let document = page(
            r#"<meta property="og:title" content="Drake (@champagnepapi) • Instagram photos and videos">
               <meta property="og:image" content="https://cdn.example/pic.jpg">
               <meta property="og:url" content="https://www.instagram.com/champagnepapi/">
               <meta name="description" content="142M Followers, 3,512 Following, 582 Posts - Drake (@champagnepapi) on Instagram: &quot;&amp;#064;ovo &quot;for real&quot;&quot;">"#,
        );

        let partial = extract(&document, "champagnepapi").unwrap().unwrap();
        assert_eq!(partial.follower_count, Some(142_000_000));
        assert_eq!(partial.following_count, Some(3_512));
        assert_eq!(partial.post_count, Some(582));
        assert_eq!(partial.full_name.as_deref(), Some("Drake"));
        assert_eq!(partial.profile_pic_url.as_deref(), Some("https://cdn.example/pic.jpg"));
        assert_eq!(partial.biography.as_deref(), Some(r#"&#064;ovo "for real""#));
        assert_eq!(
            partial.raw["meta"]["canonical_url"],
            "https://www.instagram.com/champagnepapi/"
        );
    }

    #[test]
    fn accepts_middle_dot_and_lowercase_suffixes() {
        let document = page(
            r#"<meta property="og:description" content="1.2k followers · 12·400 following · 7 posts">"#,
        );
        let partial = extract(&document, "someone").unwrap().unwrap();
        assert_eq!(partial.follower_count, Some(1_200));
        assert_eq!(partial.following_count, Some(12_400));
        assert_eq!(partial.post_count, Some(7));
    }

    #[test]
    fn og_description_wins_over_description() {
        let document = page(
            r#"<meta name="description" content="5 Followers, 5 Following, 5 Posts">
               <meta property="og:description" content="9 Followers, 9 Following, 9 Posts">"#,
        );
        let partial = extract(&document, "someone").unwrap().unwrap();
        assert_eq!(partial.follower_count, Some(9));
    }

    #[test]
    fn title_equal_to_username_is_not_a_name() {
        let document = page(r#"<meta property="og:title" content="someone (@someone) • Instagram">"#);
        let partial = extract(&document, "someone").unwrap().unwrap();
        assert_eq!(partial.full_name, None);
    }

    #[test]
    fn name_differing_from_handle_by_case_is_kept() {
        assert_eq!(
            title_name("Someone (@SOMEONE) • Instagram photos and videos", "someone").unwrap().as_deref(),
            Some("Someone")
        );
        assert_eq!(title_name("Someone (@other) • Instagram", "someone").unwrap(), None);
    }

    #[test]
    fn unrelated_meta_tags_are_absent() {
        let document = page(r#"<meta name="viewport" content="width=device-width">"#);
        assert!(extract(&document, "someone").unwrap().is_none());
    }
}
