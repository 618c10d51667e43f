use scraper::Html;
use serde_json::Value;

use super::{count_value, selector, string_field, PartialProfile, SourceParseError};

pub(super) fn extract(document: &Html) -> Result<Option<PartialProfile>, SourceParseError> {
    let blocks = selector(r#"script[type="application/ld+json"]"#)?;
    let mut last_error = None;

    for block in document.select(&blocks) {
        let text: String = block.text().collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                last_error = Some(SourceParseError::Json(e));
                continue;
            }
        };

        if let Some(person) = find_person(&value) {
            return Ok(Some(person_profile(person)));
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

fn find_person(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_person),
        Value::Object(map) => {
            if is_person(map.get("@type")) {
                return Some(value);
            }
            map.get("mainEntity")
                .and_then(find_person)
                .or_else(|| map.get("@graph").and_then(find_person))
        }
        _ => None,
    }
}

fn is_person(node_type: Option<&Value>) -> bool {
    match node_type {
        Some(Value::String(s)) => s == "Person",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Person")),
        _ => false,
    }
}

fn person_profile(person: &Value) -> PartialProfile {
    let image = match person.get("image") {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url.trim().to_string()),
        Some(image @ Value::Object(_)) => {
            string_field(image, "url").or_else(|| string_field(image, "contentUrl"))
        }
        _ => None,
    };

    let mut partial = PartialProfile {
        full_name: string_field(person, "name"),
        biography: string_field(person, "description"),
        profile_pic_url: image,
        follower_count: follower_statistic(person),
        ..PartialProfile::default()
    };

    partial.raw.insert("json_ld".to_string(), person.clone());
    partial
}

// schema.org InteractionCounter with a FollowAction type
fn follower_statistic(person: &Value) -> Option<u64> {
    let stats = person.get("interactionStatistic")?;
    let entries: Vec<&Value> = match stats {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    entries
        .into_iter()
        .find(|entry| {
            let kind = match entry.get("interactionType") {
                Some(Value::String(s)) => s.as_str(),
                Some(object) => object.get("@type").and_then(Value::as_str).unwrap_or(""),
                None => "",
            };
            kind.ends_with("FollowAction")
        })
        .and_then(|entry| count_value(entry.get("userInteractionCount")))
}
