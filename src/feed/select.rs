// src/feed/select.rs
use crate::feed::types::FeedItem;

/// Pick the single most-recent item: the numerically greatest status id
/// wins, ties keep the first-encountered item. `None` on an empty
/// candidate list.
///
/// Pure and synchronous so it can be exercised without any I/O.
pub fn select_latest(items: &[FeedItem]) -> Option<&FeedItem> {
    let mut latest: Option<&FeedItem> = None;
    for item in items {
        match latest {
            Some(best) if best.id >= item.id => {}
            _ => latest = Some(item),
        }
    }
    latest
}
