use chrono::{DateTime, Utc};

use super::sources::{external_link, SourceKind, SourceOutcome};
use crate::models::instagram::ProfileRecord;

/// Folds source outcomes into a record, following [`SourceKind::PRIORITY`].
///
/// A field set by a higher-priority source is never overwritten. Text that
/// decodes to nothing does not count as set. Failed and empty outcomes
/// contribute nothing. `bio_links` holds the external URL first, normalized
/// like the anchor scan results that follow it.
pub fn merge(username: &str, outcomes: &[SourceOutcome], scraped_at: DateTime<Utc>) -> ProfileRecord {
    let mut record = ProfileRecord::new(username.to_string(), scraped_at);
    let mut anchor_links = Vec::new();

    for kind in SourceKind::PRIORITY {
        let partials = outcomes
            .iter()
            .filter(|outcome| outcome.kind == kind)
            .filter_map(SourceOutcome::partial);

        for partial in partials {
            fill(&mut record.full_name, &partial.full_name.as_deref().and_then(clean_text));
            fill(&mut record.biography, &partial.biography.as_deref().and_then(clean_text));
            fill(&mut record.follower_count, &partial.follower_count);
            fill(&mut record.following_count, &partial.following_count);
            fill(&mut record.post_count, &partial.post_count);
            fill(&mut record.profile_pic_url, &partial.profile_pic_url);
            fill(&mut record.external_url, &partial.external_url);
            fill(&mut record.is_verified, &partial.is_verified);
            fill(&mut record.is_private, &partial.is_private);
            fill(&mut record.is_business, &partial.is_business);

            for (key, value) in &partial.raw {
                record.raw.entry(key.clone()).or_insert_with(|| value.clone());
            }
            anchor_links.extend(partial.links.iter().cloned());
        }
    }

    if let Some(external) = record.external_url.as_deref().and_then(external_link) {
        record.bio_links.insert(external);
    }
    record.bio_links.extend(anchor_links);

    record
}

fn fill<T: Clone>(slot: &mut Option<T>, candidate: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(candidate);
    }
}

fn clean_text(text: &str) -> Option<String> {
    let decoded = decode_entities(text);
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decodes the HTML entities Instagram leaves in profile text
/// (`&#064;`, `&quot;`, `&amp;` and any numeric reference). Single pass, so
/// `&amp;#064;` becomes `&#064;` rather than `@`.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::instagram::sources::{PartialProfile, SourceParseError};

    fn matched(kind: SourceKind, partial: PartialProfile) -> SourceOutcome {
        SourceOutcome {
            kind,
            result: Ok(Some(partial)),
        }
    }

    #[test]
    fn decodes_residual_entities() {
        assert_eq!(decode_entities("&#064;ovo &quot;hi&quot;"), "@ovo \"hi\"");
        assert_eq!(decode_entities("a &amp; b &#x40; c"), "a & b @ c");
        assert_eq!(decode_entities("&amp;#064;"), "&#064;");
        assert_eq!(decode_entities("AT&T; fish & chips &unknown;"), "AT&T; fish & chips &unknown;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn higher_priority_source_wins() {
        let outcomes = vec![
            matched(
                SourceKind::MetaTags,
                PartialProfile {
                    follower_count: Some(1),
                    post_count: Some(7),
                    ..PartialProfile::default()
                },
            ),
            matched(
                SourceKind::EmbeddedJson,
                PartialProfile {
                    follower_count: Some(142_000_123),
                    ..PartialProfile::default()
                },
            ),
        ];

        let record = merge("drake", &outcomes, Utc::now());
        assert_eq!(record.follower_count(), Some(142_000_123));
        assert_eq!(record.post_count(), Some(7));
    }

    #[test]
    fn failed_sources_contribute_nothing() {
        let broken = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let outcomes = vec![
            SourceOutcome {
                kind: SourceKind::EmbeddedJson,
                result: Err(SourceParseError::Json(broken)),
            },
            matched(
                SourceKind::PageTitle,
                PartialProfile {
                    full_name: Some("Title Name".to_string()),
                    ..PartialProfile::default()
                },
            ),
        ];

        let record = merge("someone", &outcomes, Utc::now());
        assert_eq!(record.full_name(), Some("Title Name"));
    }

    #[test]
    fn bio_links_start_with_external_url() {
        let outcomes = vec![
            matched(
                SourceKind::EmbeddedJson,
                PartialProfile {
                    external_url: Some("https://linktr.ee/drake".to_string()),
                    biography: Some("  &#064;ovo  ".to_string()),
                    ..PartialProfile::default()
                },
            ),
            matched(
                SourceKind::AnchorScan,
                PartialProfile {
                    links: vec![
                        "https://shop.example".to_string(),
                        "https://linktr.ee/drake".to_string(),
                    ],
                    ..PartialProfile::default()
                },
            ),
        ];

        let record = merge("drake", &outcomes, Utc::now());
        assert_eq!(record.biography(), Some("@ovo"));
        assert_eq!(
            record.bio_links().as_slice(),
            ["https://linktr.ee/drake", "https://shop.example"]
        );
    }

    #[test]
    fn external_url_and_matching_anchor_are_one_bio_link() {
        let outcomes = vec![
            matched(
                SourceKind::EmbeddedJson,
                PartialProfile {
                    external_url: Some("https://linktr.ee/drake?utm_source=ig".to_string()),
                    ..PartialProfile::default()
                },
            ),
            matched(
                SourceKind::AnchorScan,
                PartialProfile {
                    links: vec!["https://linktr.ee/drake".to_string()],
                    ..PartialProfile::default()
                },
            ),
        ];

        let record = merge("drake", &outcomes, Utc::now());
        assert_eq!(record.external_url(), Some("https://linktr.ee/drake?utm_source=ig"));
        assert_eq!(record.bio_links().as_slice(), ["https://linktr.ee/drake"]);
    }

    #[test]
    fn blank_text_does_not_block_lower_priority_sources() {
        let outcomes = vec![
            matched(
                SourceKind::EmbeddedJson,
                PartialProfile {
                    biography: Some("&nbsp;".to_string()),
                    full_name: Some(" &#32; ".to_string()),
                    ..PartialProfile::default()
                },
            ),
            matched(
                SourceKind::MetaTags,
                PartialProfile {
                    biography: Some("real bio".to_string()),
                    full_name: Some("Drake".to_string()),
                    ..PartialProfile::default()
                },
            ),
        ];

        let record = merge("drake", &outcomes, Utc::now());
        assert_eq!(record.biography(), Some("real bio"));
        assert_eq!(record.full_name(), Some("Drake"));
    }

    #[test]
    fn on_site_external_url_is_not_a_bio_link() {
        let outcomes = vec![matched(
            SourceKind::EmbeddedJson,
            PartialProfile {
                external_url: Some("https://www.instagram.com/ovo/".to_string()),
                ..PartialProfile::default()
            },
        )];

        let record = merge("drake", &outcomes, Utc::now());
        assert_eq!(record.external_url(), Some("https://www.instagram.com/ovo/"));
        assert!(record.bio_links().is_empty());
    }

    #[test]
    fn nothing_found_leaves_only_username() {
        let outcomes: Vec<SourceOutcome> = SourceKind::PRIORITY
            .iter()
            .map(|&kind| SourceOutcome { kind, result: Ok(None) })
            .collect();
        let record = merge("ghost", &outcomes, Utc::now());
        assert_eq!(record.username(), "ghost");
        assert!(record.is_empty());
    }
}
