// src/subscriptions.rs
//! Tenant ↔ tracked-identity subscriptions. The relay only ever sees a
//! snapshot, taken fresh once per tick, so membership edits land on the
//! next cycle without any coordination.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

pub const ENV_PATH: &str = "RELAY_SUBSCRIPTIONS_PATH";

/// On-disk shape, TOML or JSON:
///
/// ```toml
/// [tenants]
/// "111111111111111111" = ["jane", "john"]
///
/// [webhooks]
/// "111111111111111111" = "https://discord.com/api/webhooks/..."
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SubscriptionsFile {
    #[serde(default)]
    pub tenants: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub webhooks: HashMap<String, String>,
}

/// One tick's view of who tracks what. Tenant and identity strings are
/// trimmed and deduplicated on construction; empties are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    by_tenant: BTreeMap<String, Vec<String>>,
}

impl SubscriptionSnapshot {
    pub fn new(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut by_tenant = BTreeMap::new();
        for (tenant, identities) in raw {
            let tenant = tenant.trim().to_string();
            if tenant.is_empty() {
                continue;
            }
            let mut set = BTreeSet::new();
            for identity in identities {
                let identity = identity.trim();
                if !identity.is_empty() {
                    set.insert(identity.to_string());
                }
            }
            by_tenant.insert(tenant, set.into_iter().collect());
        }
        Self { by_tenant }
    }

    /// Flattened union of all tracked identities, deduplicated, in
    /// stable order.
    pub fn identities(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        for identities in self.by_tenant.values() {
            set.extend(identities.iter().cloned());
        }
        set.into_iter().collect()
    }

    /// Tenants subscribed to `identity`, in stable order.
    pub fn tenants_tracking(&self, identity: &str) -> Vec<&str> {
        self.by_tenant
            .iter()
            .filter(|(_, ids)| ids.iter().any(|i| i == identity))
            .map(|(tenant, _)| tenant.as_str())
            .collect()
    }

    pub fn tenant_count(&self) -> usize {
        self.by_tenant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tenant.is_empty()
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Resolve the current tenant ↔ identity mapping. Failure here
    /// aborts the whole tick (never just one identity).
    async fn snapshot(&self) -> Result<SubscriptionSnapshot>;
}

/// File-backed store. Re-reads the file on every snapshot.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the file via env var + fallbacks:
    /// 1) $RELAY_SUBSCRIPTIONS_PATH
    /// 2) config/subscriptions.toml
    /// 3) config/subscriptions.json
    pub fn from_env() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Ok(Self::new(pb));
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/subscriptions.toml");
        if toml_p.exists() {
            return Ok(Self::new(toml_p));
        }
        let json_p = PathBuf::from("config/subscriptions.json");
        if json_p.exists() {
            return Ok(Self::new(json_p));
        }
        Err(anyhow!(
            "no subscriptions file: set {ENV_PATH} or create config/subscriptions.toml"
        ))
    }

    pub fn load(&self) -> Result<SubscriptionsFile> {
        load_from(&self.path)
    }
}

#[async_trait]
impl SubscriptionStore for FileStore {
    async fn snapshot(&self) -> Result<SubscriptionSnapshot> {
        Ok(SubscriptionSnapshot::new(self.load()?.tenants))
    }
}

/// Load subscriptions from an explicit path. Supports TOML or JSON.
pub fn load_from(path: &Path) -> Result<SubscriptionsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading subscriptions from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_subscriptions(&content, ext.as_str())
}

fn parse_subscriptions(s: &str, hint_ext: &str) -> Result<SubscriptionsFile> {
    let try_toml = hint_ext == "toml" || s.contains("[tenants]");
    if try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported subscriptions format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_and_json_parse_to_the_same_shape() {
        let toml_src = r#"
[tenants]
"g1" = [" jane ", "", "john", "john"]

[webhooks]
"g1" = "https://discord.example/hook"
"#;
        let json_src = r#"{"tenants": {"g1": ["jane", "john"]}, "webhooks": {"g1": "https://discord.example/hook"}}"#;

        let from_toml = parse_subscriptions(toml_src, "toml").unwrap();
        let from_json = parse_subscriptions(json_src, "json").unwrap();

        let snap_toml = SubscriptionSnapshot::new(from_toml.tenants);
        let snap_json = SubscriptionSnapshot::new(from_json.tenants);
        assert_eq!(snap_toml, snap_json);
        assert_eq!(snap_toml.identities(), vec!["jane", "john"]);
        assert_eq!(from_toml.webhooks.get("g1").unwrap(), "https://discord.example/hook");
    }

    #[test]
    fn union_is_deduplicated_across_tenants() {
        let mut raw = BTreeMap::new();
        raw.insert("g1".to_string(), vec!["jane".into(), "john".into()]);
        raw.insert("g2".to_string(), vec!["john".into(), "alice".into()]);
        let snap = SubscriptionSnapshot::new(raw);
        assert_eq!(snap.identities(), vec!["alice", "jane", "john"]);
        assert_eq!(snap.tenants_tracking("john"), vec!["g1", "g2"]);
        assert_eq!(snap.tenants_tracking("alice"), vec!["g2"]);
        assert!(snap.tenants_tracking("nobody").is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn from_env_prefers_env_path_and_errors_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("subs.json");
        std::fs::write(&p, r#"{"tenants": {"g1": ["jane"]}}"#).unwrap();

        env::set_var(ENV_PATH, p.display().to_string());
        let store = FileStore::from_env().unwrap();
        let file = store.load().unwrap();
        assert_eq!(file.tenants.get("g1").unwrap(), &vec!["jane".to_string()]);

        env::set_var(ENV_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(FileStore::from_env().is_err());
        env::remove_var(ENV_PATH);
    }
}
