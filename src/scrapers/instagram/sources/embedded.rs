use scraper::Html;
use serde_json::Value;

use super::{bool_field, count_value, selector, string_field, PartialProfile, SourceParseError};
use crate::scrapers::instagram::json_blob::first_json_object;

/// Text fragments that mark a script as carrying hydration data.
const MARKERS: [&str; 6] = [
    "\"ProfilePage\"",
    "window._sharedData",
    "window.__additionalDataLoaded",
    "relayPrefetch",
    "RelayPrefetchedStreamCache",
    "xdt_api__v1__users__web_profile_info",
];

pub(super) fn extract(document: &Html) -> Result<Option<PartialProfile>, SourceParseError> {
    let scripts = selector("script")?;
    let mut last_error = None;

    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        if !MARKERS.iter().any(|marker| text.contains(marker)) {
            continue;
        }

        let Some(blob) = first_json_object(&text) else {
            last_error = Some(SourceParseError::Unbalanced(text.len()));
            continue;
        };

        let payload: Value = match serde_json::from_str(blob) {
            Ok(payload) => payload,
            Err(e) => {
                last_error = Some(SourceParseError::Json(e));
                continue;
            }
        };

        if let Some(user) = find_user(&payload) {
            return Ok(Some(user_profile(user)));
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Locates the user object inside any of the known payload shapes.
fn find_user(payload: &Value) -> Option<&Value> {
    [
        payload.pointer("/entry_data/ProfilePage/0/graphql/user"),
        payload.pointer("/graphql/user"),
        payload.get("user"),
        payload.pointer("/data/user"),
        profile_page_container(payload),
    ]
    .into_iter()
    .flatten()
    .find(|user| user.is_object())
}

// {"require":[["ProfilePageContainer", _, _, {"user": {...}}], ...]}
fn profile_page_container(payload: &Value) -> Option<&Value> {
    payload
        .get("require")?
        .as_array()?
        .iter()
        .find(|item| item.get(0).and_then(Value::as_str) == Some("ProfilePageContainer"))?
        .get(3)?
        .get("user")
}

fn user_profile(user: &Value) -> PartialProfile {
    let mut partial = PartialProfile {
        full_name: string_field(user, "full_name"),
        biography: string_field(user, "biography"),
        external_url: string_field(user, "external_url"),
        profile_pic_url: string_field(user, "profile_pic_url_hd")
            .or_else(|| string_field(user, "profile_pic_url")),
        is_verified: bool_field(user, "is_verified"),
        is_private: bool_field(user, "is_private"),
        is_business: bool_field(user, "is_business_account").or_else(|| bool_field(user, "is_business")),
        follower_count: count_value(user.pointer("/edge_followed_by/count"))
            .or_else(|| count_value(user.get("follower_count"))),
        following_count: count_value(user.pointer("/edge_follow/count"))
            .or_else(|| count_value(user.get("following_count"))),
        post_count: count_value(user.pointer("/edge_owner_to_timeline_media/count"))
            .or_else(|| count_value(user.get("media_count"))),
        ..PartialProfile::default()
    };

    partial.raw.insert("graphql_user".to_string(), user.clone());
    partial
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(script: &str) -> Html {
        Html::parse_document(&format!(
            "<html><head><script type=\"text/javascript\">{script}</script></head><body></body></html>"
        ))
    }

    #[test]
    fn reads_shared_data_shape() {
        let document = page(
            r#"window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{
                "username":"drake","full_name":"Drake","biography":"bio",
                "edge_followed_by":{"count":142000000},"edge_follow":{"count":3512},
                "edge_owner_to_timeline_media":{"count":582},
                "is_verified":true,"is_private":false,"is_business_account":false,
                "profile_pic_url":"https://cdn.example/small.jpg",
                "profile_pic_url_hd":"https://cdn.example/hd.jpg"}}}]}};"#,
        );

        let partial = extract(&document).unwrap().unwrap();
        assert_eq!(partial.full_name.as_deref(), Some("Drake"));
        assert_eq!(partial.follower_count, Some(142_000_000));
        assert_eq!(partial.following_count, Some(3_512));
        assert_eq!(partial.post_count, Some(582));
        assert_eq!(partial.is_verified, Some(true));
        assert_eq!(partial.is_private, Some(false));
        assert_eq!(partial.is_business, Some(false));
        assert_eq!(partial.profile_pic_url.as_deref(), Some("https://cdn.example/hd.jpg"));
        assert_eq!(partial.raw["graphql_user"]["username"], "drake");
    }

    #[test]
    fn reads_flat_api_shapes() {
        let data_user = page(
            r#"relayPrefetch({"data":{"user":{
                "follower_count":10,"following_count":"1,200","media_count":3,"is_business":true}}});"#,
        );
        let partial = extract(&data_user).unwrap().unwrap();
        assert_eq!(partial.follower_count, Some(10));
        assert_eq!(partial.following_count, Some(1_200));
        assert_eq!(partial.post_count, Some(3));
        assert_eq!(partial.is_business, Some(true));

        let root_user = page(
            r#"window.__additionalDataLoaded('/someone/',{"user":{"full_name":"Some One"}});"#,
        );
        let partial = extract(&root_user).unwrap().unwrap();
        assert_eq!(partial.full_name.as_deref(), Some("Some One"));
    }

    #[test]
    fn reads_profile_page_container() {
        let document = page(
            r#"{"require":[["Other"],["ProfilePageContainer",null,null,{"user":{"biography":"hi"}}]],"x":"ProfilePage"}"#,
        );
        let partial = extract(&document).unwrap().unwrap();
        assert_eq!(partial.biography.as_deref(), Some("hi"));
    }

    #[test]
    fn unmarked_scripts_are_ignored() {
        let document = page(r#"var config = {"user":{"full_name":"Nope"}};"#);
        assert!(extract(&document).unwrap().is_none());
    }

    #[test]
    fn unknown_shape_is_absent_not_an_error() {
        let document = page(r#"window._sharedData = {"config":{"viewer":null}};"#);
        assert!(extract(&document).unwrap().is_none());
    }

    #[test]
    fn truncated_blob_is_reported() {
        let document = page(r#"window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":"#);
        assert!(matches!(extract(&document), Err(SourceParseError::Unbalanced(_))));
    }

    #[test]
    fn malformed_json_is_reported() {
        let document = page(r#"window._sharedData = {"entry_data": nope};"#);
        assert!(matches!(extract(&document), Err(SourceParseError::Json(_))));
    }

    #[test]
    fn later_script_can_recover_after_a_broken_one() {
        let document = Html::parse_document(
            r#"<html><head>
            <script>window._sharedData = {"broken": </script>
            <script>window._sharedData = {"user":{"full_name":"Recovered"}};</script>
            </head></html>"#,
        );
        let partial = extract(&document).unwrap().unwrap();
        assert_eq!(partial.full_name.as_deref(), Some("Recovered"));
    }
}
