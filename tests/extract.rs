use std::fs;
use std::path::PathBuf;

use igprofile::models::instagram::{ExtractResponse, SourceStatus};
use igprofile::{extract, normalize_username, Extraction, SourceKind, ValidationError};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {}", path.display(), e))
}

#[test]
fn shared_data_page_uses_embedded_values() {
    let record = extract(&fixture("shared_data.html"), "champagnepapi").unwrap();

    assert_eq!(record.username(), "champagnepapi");
    assert_eq!(record.full_name(), Some("Drake"));
    assert_eq!(record.biography(), Some("@ovo {not json} \"quoted\""));
    // embedded JSON outranks the rounded meta description count
    assert_eq!(record.follower_count(), Some(142_000_123));
    assert_eq!(record.following_count(), Some(3512));
    assert_eq!(record.post_count(), Some(582));
    assert_eq!(record.profile_pic_url(), Some("https://scontent.cdninstagram.com/v/hd_pic.jpg"));
    assert_eq!(record.is_verified(), Some(true));
    assert_eq!(record.is_private(), Some(false));
    assert_eq!(record.is_business(), Some(false));
    assert_eq!(
        record.bio_links().as_slice(),
        ["https://linktr.ee/drake", "https://ovo.example/tour"]
    );
    assert_eq!(record.external_url(), Some("https://linktr.ee/drake?utm_source=ig"));
    assert!(record.raw().contains_key("graphql_user"));
    assert!(record.raw().contains_key("meta"));
}

#[test]
fn meta_only_page_parses_abbreviated_counts() {
    let record = extract(&fixture("meta_only.html"), "champagnepapi").unwrap();

    assert_eq!(record.follower_count(), Some(142_000_000));
    assert_eq!(record.following_count(), Some(3512));
    assert_eq!(record.post_count(), Some(582));
    assert_eq!(record.full_name(), Some("Drake"));
    assert_eq!(record.biography(), Some("@ovo all day"));
    assert_eq!(record.profile_pic_url(), Some("https://scontent.cdninstagram.com/v/meta_pic.jpg"));
    assert_eq!(record.is_verified(), None);
    assert_eq!(record.is_private(), None);
    assert!(record.bio_links().is_empty());
}

#[test]
fn json_ld_person_is_found_inside_graph() {
    let record = extract(&fixture("json_ld.html"), "natgeo").unwrap();

    assert_eq!(record.full_name(), Some("National Geographic"));
    assert_eq!(record.biography(), Some("Taking our understanding of the world further."));
    assert_eq!(record.follower_count(), Some(283_000_000));
    assert_eq!(record.profile_pic_url(), Some("https://scontent.cdninstagram.com/v/natgeo.jpg"));
    assert_eq!(record.external_url(), None);
    assert_eq!(record.bio_links().as_slice(), ["https://www.natgeo.com/"]);
    assert!(record.raw().contains_key("json_ld"));
}

#[test]
fn data_free_page_yields_only_username() {
    let record = extract(&fixture("empty.html"), "ghost").unwrap();

    assert_eq!(record.username(), "ghost");
    assert!(record.is_empty());

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["username"], "ghost");
    assert!(json["scraped_at"].is_string());
    assert!(json["full_name"].is_null());
    assert_eq!(json["bio_links"], serde_json::json!([]));
}

#[test]
fn truncated_embedded_json_falls_back_to_other_sources() {
    let extraction = Extraction::run(&fixture("truncated.html"), "someone").unwrap();

    let failed: Vec<SourceKind> = extraction.failures().map(|(kind, _)| kind).collect();
    assert_eq!(failed, [SourceKind::EmbeddedJson]);

    let record = &extraction.record;
    assert_eq!(record.follower_count(), Some(1200));
    assert_eq!(record.following_count(), Some(300));
    assert_eq!(record.post_count(), Some(45));
    assert_eq!(record.full_name(), Some("Someone"));
    assert_eq!(record.bio_links().as_slice(), ["https://someone.example/shop"]);
}

#[test]
fn extract_report_lists_every_source() {
    let extraction = Extraction::run(&fixture("truncated.html"), "someone").unwrap();
    let response = ExtractResponse::from(extraction);

    let statuses: Vec<(SourceKind, SourceStatus)> = response
        .sources
        .iter()
        .map(|report| (report.source, report.status))
        .collect();
    assert_eq!(
        statuses,
        [
            (SourceKind::EmbeddedJson, SourceStatus::Failed),
            (SourceKind::JsonLd, SourceStatus::Absent),
            (SourceKind::MetaTags, SourceStatus::Matched),
            (SourceKind::PageTitle, SourceStatus::Matched),
            (SourceKind::AnchorScan, SourceStatus::Matched),
        ]
    );
    assert!(response.sources[0].error.is_some());
}

#[test]
fn profile_url_input_is_normalized_before_extraction() {
    let record = extract(
        &fixture("meta_only.html"),
        "https://www.instagram.com/champagnepapi/?hl=en",
    )
    .unwrap();
    assert_eq!(record.username(), "champagnepapi");
    assert_eq!(record.full_name(), Some("Drake"));
}

#[test]
fn invalid_username_is_rejected() {
    let result = extract(&fixture("empty.html"), "not a user!");
    assert!(matches!(result, Err(ValidationError::InvalidUsername(_))));

    let schemeless = normalize_username("instagram.com/drake/");
    assert!(matches!(schemeless, Err(ValidationError::InvalidUsername(_))));
}

#[test]
fn normalization_is_idempotent() {
    for input in ["drake", "https://instagram.com/drake", "https://www.instagram.com/drake/?hl=en", " @drake "] {
        let once = normalize_username(input).unwrap();
        assert_eq!(once, "drake", "input {input}");
        assert_eq!(normalize_username(&once).unwrap(), once);
    }
}
