// src/feed/fetcher.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use url::Url;

use crate::feed::types::{FeedItem, FeedSource, FetchError};
use crate::feed::{extract_status_id, extract_text, parse_pub_date};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// HTTP feed source for a Nitter instance. The feed address is
/// `{base}/{identity}/rss` with the identity percent-escaped as a single
/// path segment.
pub struct NitterFetcher {
    base: Url,
    client: reqwest::Client,
}

impl NitterFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let trimmed = base_url.trim_end_matches('/');
        let base =
            Url::parse(trimmed).map_err(|e| FetchError::BaseUrl(format!("{trimmed}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::BaseUrl(trimmed.to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent("nitter-relay/0.1 (+github.com/lumlich/nitter-relay)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Ok(Self { base, client })
    }

    fn feed_url(&self, identity: &str) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was ruled out in the constructor
        url.path_segments_mut()
            .expect("base url accepts path segments")
            .pop_if_empty()
            .push(identity)
            .push("rss");
        url
    }

    /// Parse one RSS document into candidate items.
    ///
    /// A body that is present but malformed or structurally empty yields
    /// an empty list, not an error; only the HTTP layer produces
    /// `FetchError`. Entries without a `/status/<digits>` link are
    /// dropped here since they cannot be ordered or deduplicated.
    pub fn parse_feed(identity: &str, xml: &str) -> Vec<FeedItem> {
        let t0 = std::time::Instant::now();
        let rss: Rss = match from_str(xml) {
            Ok(rss) => rss,
            Err(e) => {
                tracing::warn!(identity, error = %e, "malformed feed document, treating as empty");
                return Vec::new();
            }
        };

        let mut out = Vec::with_capacity(rss.channel.items.len());
        for it in rss.channel.items {
            let link = match it.link {
                Some(l) => l,
                None => continue,
            };
            let Some(id) = extract_status_id(&link) else {
                continue;
            };
            out.push(FeedItem {
                id,
                text: extract_text(it.title.as_deref().unwrap_or_default()),
                url: link,
                published_at: it.pub_date.as_deref().and_then(parse_pub_date),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("relay_parse_ms").record(ms);
        counter!("relay_items_parsed_total").increment(out.len() as u64);
        out
    }
}

#[async_trait]
impl FeedSource for NitterFetcher {
    async fn fetch(&self, identity: &str) -> Result<Vec<FeedItem>, FetchError> {
        if identity.trim().is_empty() {
            return Err(FetchError::EmptyIdentity);
        }
        let url = self.feed_url(identity);
        tracing::debug!(identity, url = %url, "fetching feed");

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let body = resp.text().await?;
        Ok(Self::parse_feed(identity, &body))
    }
}
