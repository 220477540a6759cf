// src/notify/mod.rs
pub mod discord;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::feed::types::StatusId;

/// The result of processing one new post: built at most once per tick,
/// then handed to delivery once per subscribed tenant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub identity: String,
    pub id: StatusId,
    pub url: String,
    pub text: String,
    pub translated: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Delivery seam to the chat platform. The implementation owns tenant →
/// channel resolution and presentation; the relay is agnostic to both.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, tenant: &str, note: &Notification) -> Result<()>;
}
