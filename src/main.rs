//! Binary entrypoint: wires the feed fetcher, translator, subscription
//! store, and Discord delivery together, then runs the poll loop until
//! ctrl-c.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nitter_relay::config::RelayConfig;
use nitter_relay::feed::fetcher::NitterFetcher;
use nitter_relay::metrics::Metrics;
use nitter_relay::notify::discord::DiscordNotifier;
use nitter_relay::relay::{Relay, RelayCfg};
use nitter_relay::seen::SeenState;
use nitter_relay::subscriptions::FileStore;
use nitter_relay::translate::Translator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = RelayConfig::from_env()?;

    let metrics = Metrics::init(cfg.interval.as_millis() as u64);
    if let Some(addr) = cfg.metrics_addr {
        let router = metrics.router();
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    info!(%addr, "metrics server listening");
                    if let Err(e) = axum::serve(listener, router).await {
                        error!(error = %e, "metrics server exited");
                    }
                }
                Err(e) => error!(%addr, error = %e, "failed to bind metrics server"),
            }
        });
    }

    // Both collaborators must resolve before the loop starts; a missing
    // or unreadable subscriptions file is fatal here, not mid-tick.
    let store = FileStore::from_env()?;
    let initial = store
        .load()
        .context("loading initial subscriptions file")?;
    info!(
        tenants = initial.tenants.len(),
        webhooks = initial.webhooks.len(),
        "subscriptions loaded"
    );

    let fetcher = NitterFetcher::new(&cfg.base_url).context("building feed fetcher")?;
    let delivery = DiscordNotifier::new(initial.webhooks);
    let translator = Translator::from_env();

    let relay = Relay::new(
        Arc::new(store),
        Arc::new(fetcher),
        translator,
        Arc::new(delivery),
        SeenState::new(),
        RelayCfg {
            interval: cfg.interval,
        },
    );

    info!(
        base_url = %cfg.base_url,
        interval_ms = cfg.interval.as_millis() as u64,
        "starting relay"
    );
    let handle = relay.spawn();

    tokio::signal::ctrl_c().await?;
    handle.stop().await;
    info!("relay stopped");
    Ok(())
}
