use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Deliver, Notification};

/// Webhook-based Discord delivery. Each tenant (guild) maps to one
/// webhook URL; tenants without a webhook are skipped, not failed, so a
/// half-configured file still relays to everyone else.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhooks: HashMap<String, String>,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordNotifier {
    pub fn new(webhooks: HashMap<String, String>) -> Self {
        Self {
            webhooks,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    fn payload(note: &Notification) -> DiscordWebhookPayload {
        let title = format!("New post from @{}", note.identity);

        let mut description = note.translated.clone();
        if note.translated != note.text {
            description.push_str("\n\n> ");
            description.push_str(&note.text);
        }
        description.push('\n');
        description.push_str(&note.url);
        if let Some(ts) = note.published_at {
            description.push_str(&format!("\nPosted (UTC): {}", ts.to_rfc3339()));
        }

        DiscordWebhookPayload::embed(&title, &description)
    }
}

#[async_trait]
impl Deliver for DiscordNotifier {
    async fn deliver(&self, tenant: &str, note: &Notification) -> Result<()> {
        let Some(webhook) = self.webhooks.get(tenant) else {
            tracing::debug!(tenant, "no webhook configured, skipping delivery");
            return Ok(());
        };

        let payload = Self::payload(note);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(webhook)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("Discord webhook HTTP error: {e}"));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("Discord webhook request failed: {e}"));
                }
            }
        }
    }
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn embed(title: &str, description: &str) -> Self {
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::StatusId;

    #[test]
    fn payload_quotes_original_only_when_translation_differs() {
        let mut note = Notification {
            identity: "jane".to_string(),
            id: StatusId::parse("42").unwrap(),
            url: "https://nitter.example/jane/status/42".to_string(),
            text: "hello".to_string(),
            translated: "bonjour".to_string(),
            published_at: None,
        };
        let p = DiscordNotifier::payload(&note);
        assert!(p.embeds[0].description.contains("bonjour"));
        assert!(p.embeds[0].description.contains("> hello"));

        note.translated = note.text.clone();
        let p = DiscordNotifier::payload(&note);
        assert!(!p.embeds[0].description.contains('>'));
        assert!(p.embeds[0].description.contains("hello"));
    }
}
