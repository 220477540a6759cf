// tests/feed_parse.rs
use nitter_relay::feed::fetcher::NitterFetcher;
use nitter_relay::feed::select::select_latest;

#[test]
fn fixture_parses_to_candidates_with_status_ids_only() {
    let xml: &str = include_str!("fixtures/feed_jane.xml");
    let items = NitterFetcher::parse_feed("jane", xml);

    // The profile-note entry has no /status/ link and is dropped.
    assert_eq!(items.len(), 2);
    assert!(items
        .iter()
        .all(|i| i.url.contains("/status/")));
}

#[test]
fn titles_lose_the_author_prefix_and_entities() {
    let xml: &str = include_str!("fixtures/feed_jane.xml");
    let items = NitterFetcher::parse_feed("jane", xml);

    let latest = select_latest(&items).expect("candidates exist");
    assert_eq!(latest.id.as_str(), "1834567890123456790");
    assert_eq!(latest.text, "second post & a link");
    assert!(latest.published_at.is_some());
}

#[test]
fn parsing_and_selection_are_idempotent() {
    let xml: &str = include_str!("fixtures/feed_jane.xml");
    let first = NitterFetcher::parse_feed("jane", xml);
    let second = NitterFetcher::parse_feed("jane", xml);

    assert_eq!(first, second);
    assert_eq!(
        select_latest(&first).map(|i| i.id.clone()),
        select_latest(&second).map(|i| i.id.clone())
    );
}

#[test]
fn structurally_empty_feed_yields_no_candidates() {
    let xml: &str = include_str!("fixtures/feed_empty.xml");
    let items = NitterFetcher::parse_feed("quiet", xml);
    assert!(items.is_empty());
}

#[test]
fn malformed_document_yields_no_candidates() {
    let items = NitterFetcher::parse_feed("jane", "this is not xml at all");
    assert!(items.is_empty());

    let items = NitterFetcher::parse_feed("jane", "<html><body>rate limited</body></html>");
    assert!(items.is_empty());
}
