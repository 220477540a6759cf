// src/feed/mod.rs
pub mod fetcher;
pub mod select;
pub mod types;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::feed::types::StatusId;

/// Extract the post text from a feed item title.
///
/// Nitter titles embed the author before the content, either as
/// `"Name (@handle): content"` or `"Name: content"`. Only the first
/// separator counts, and `"): "` wins over a plain `": "` so a colon
/// inside the display name does not truncate the post. Titles without
/// either separator pass through as-is.
pub fn extract_text(title: &str) -> String {
    let decoded = html_escape::decode_html_entities(title);
    let decoded = decoded.trim();

    if let Some(idx) = decoded.find("): ") {
        return decoded[idx + 3..].to_string();
    }
    if let Some(idx) = decoded.find(": ") {
        return decoded[idx + 2..].to_string();
    }
    decoded.to_string()
}

/// Pull the numeric status id out of a canonical post link
/// (`.../status/<digits>`). Links without the segment yield `None` and
/// the item is dropped from the candidate list.
pub fn extract_status_id(link: &str) -> Option<StatusId> {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"/status/(\d+)").unwrap());
    let caps = re.captures(link)?;
    StatusId::parse(caps.get(1)?.as_str())
}

/// RSS `pubDate` values are RFC 2822. Unparseable dates become `None`,
/// never an error.
///
/// Nitter stamps dates with the obsolete `GMT` zone name, which the
/// RFC 2822 parser rejects; it gets rewritten to a numeric offset
/// first.
pub fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let normalized = match ts.strip_suffix(" GMT").or_else(|| ts.strip_suffix(" UT")) {
        Some(stripped) => format!("{stripped} +0000"),
        None => ts.to_string(),
    };
    let parsed = OffsetDateTime::parse(&normalized, &Rfc2822).ok()?;
    DateTime::<Utc>::from_timestamp(parsed.unix_timestamp(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_handle_prefix() {
        assert_eq!(extract_text("Jane (@jane): hello world"), "hello world");
    }

    #[test]
    fn strips_plain_prefix() {
        assert_eq!(extract_text("Jane: hello world"), "hello world");
    }

    #[test]
    fn no_delimiter_passes_through() {
        assert_eq!(extract_text("no delimiter present"), "no delimiter present");
    }

    #[test]
    fn paren_delimiter_wins_over_plain() {
        // The display name itself contains ": "; the "): " further right
        // still marks the real boundary.
        assert_eq!(
            extract_text("Dr. Jane: PhD (@jane): hello world"),
            "hello world"
        );
    }

    #[test]
    fn entities_are_decoded_before_extraction() {
        assert_eq!(extract_text("Jane (@jane): a &amp; b"), "a & b");
    }

    #[test]
    fn status_id_from_link() {
        let id = extract_status_id("https://nitter.example/jane/status/1234567890#m").unwrap();
        assert_eq!(id.as_str(), "1234567890");
    }

    #[test]
    fn links_without_status_segment_yield_none() {
        assert!(extract_status_id("https://nitter.example/jane").is_none());
        assert!(extract_status_id("https://nitter.example/jane/status/").is_none());
    }

    #[test]
    fn pub_date_rfc2822() {
        let dt = parse_pub_date("Tue, 01 Jul 2025 12:30:00 GMT").unwrap();
        assert_eq!(dt.timestamp(), 1_751_373_000);
        assert!(parse_pub_date("not a date").is_none());
    }
}
