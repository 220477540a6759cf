// src/feed/types.rs
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

/// Numeric post identifier taken from a `/status/<digits>` link segment.
///
/// Nitter mirrors Twitter snowflakes, which already overflow i64 in the
/// wild, so ordering works on the canonical digit string instead of a
/// parsed integer: shorter strings are smaller, equal lengths compare
/// lexicographically. Leading zeros are normalized away on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StatusId(String);

impl StatusId {
    /// Accepts a non-empty all-digit string; anything else is `None`.
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let canonical = digits.trim_start_matches('0');
        Some(Self(if canonical.is_empty() {
            "0".to_string()
        } else {
            canonical.to_string()
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for StatusId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.len(), self.0.as_str()).cmp(&(other.0.len(), other.0.as_str()))
    }
}

impl PartialOrd for StatusId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parsed feed entry. Immutable once built; entries without an
/// extractable status id never become a `FeedItem`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeedItem {
    pub id: StatusId,
    pub url: String,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fetch failure for a single identity. Recovered locally by the relay:
/// the identity is skipped for the tick, the loop keeps going.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("empty identity handle")]
    EmptyIdentity,
    #[error("invalid feed base address: {0}")]
    BaseUrl(String),
    #[error("requesting feed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed for one tracked identity.
    ///
    /// Network-level failure is an error; a document that parses to
    /// nothing is an empty list.
    async fn fetch(&self, identity: &str) -> Result<Vec<FeedItem>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_non_digits() {
        assert!(StatusId::parse("").is_none());
        assert!(StatusId::parse("12a4").is_none());
        assert!(StatusId::parse("-123").is_none());
    }

    #[test]
    fn ordering_is_numeric() {
        let a = StatusId::parse("9").unwrap();
        let b = StatusId::parse("10").unwrap();
        assert!(a < b);
    }

    #[test]
    fn ordering_works_past_u64() {
        let a = StatusId::parse("99999999999999999999").unwrap();
        let b = StatusId::parse("100000000000000000000").unwrap();
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn leading_zeros_are_normalized() {
        let a = StatusId::parse("007").unwrap();
        let b = StatusId::parse("7").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "7");
        assert_eq!(StatusId::parse("000").unwrap().as_str(), "0");
    }
}
