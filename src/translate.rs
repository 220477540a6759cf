// src/translate.rs
//! Translation seam: a provider trait, one HTTP provider, and the
//! pass-through adapter the relay actually talks to. Translation is
//! best-effort: a failed or absent provider must never block a
//! notification, the original text goes out instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub const ENV_API_URL: &str = "TRANSLATE_API_URL";
pub const ENV_API_KEY: &str = "TRANSLATE_API_KEY";
pub const ENV_TARGET_LANG: &str = "TRANSLATE_TARGET_LANG";

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation provider returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("translation response carried no text")]
    MissingText,
}

#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// DeepL-style HTTP provider. Requires `TRANSLATE_API_URL` and
/// `TRANSLATE_API_KEY`; target language defaults to `EN`.
pub struct HttpTranslator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    target_lang: String,
}

impl HttpTranslator {
    pub fn new(endpoint: String, api_key: String, target_lang: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("nitter-relay/0.1 (+github.com/lumlich/nitter-relay)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint,
            api_key,
            target_lang,
        }
    }

    /// `None` unless both endpoint and key are configured.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var(ENV_API_URL).ok()?;
        let api_key = std::env::var(ENV_API_KEY).ok()?;
        let target_lang = std::env::var(ENV_TARGET_LANG).unwrap_or_else(|_| "EN".to_string());
        Some(Self::new(endpoint, api_key, target_lang))
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        #[derive(Serialize)]
        struct Req<'a> {
            text: Vec<&'a str>,
            target_lang: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            translations: Vec<Translation>,
        }
        #[derive(Deserialize)]
        struct Translation {
            text: String,
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&Req {
                text: vec![text],
                target_lang: &self.target_lang,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TranslationError::Status(resp.status()));
        }
        let body: Resp = resp.json().await?;
        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(TranslationError::MissingText)
    }

    fn name(&self) -> &'static str {
        "deepl"
    }
}

/// Whole-string URL check: such "text" is a media or quote link, not
/// prose, and is never sent to the provider.
fn is_bare_url(s: &str) -> bool {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"^https?://\S+$").unwrap());
    re.is_match(s)
}

/// The relay-facing adapter. Infallible: every failure path degrades to
/// the original text.
#[derive(Clone)]
pub struct Translator {
    provider: Option<Arc<dyn Translate>>,
}

impl Translator {
    pub fn new(provider: Arc<dyn Translate>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn from_env() -> Self {
        match HttpTranslator::from_env() {
            Some(p) => Self::new(Arc::new(p)),
            None => Self::disabled(),
        }
    }

    pub async fn translate(&self, text: &str) -> String {
        if text.is_empty() || is_bare_url(text) {
            return text.to_string();
        }
        let Some(provider) = &self.provider else {
            tracing::debug!("translation disabled (no provider configured)");
            return text.to_string();
        };
        match provider.translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "translation failed, passing original text through");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_urls_are_detected() {
        assert!(is_bare_url("https://example.com/x"));
        assert!(is_bare_url("http://example.com"));
        assert!(!is_bare_url("see https://example.com/x"));
        assert!(!is_bare_url("https://example.com/x trailing"));
        assert!(!is_bare_url("plain text"));
        assert!(!is_bare_url(""));
    }
}
