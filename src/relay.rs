// src/relay.rs
//! The poll cycle: priming at start-up, then a fixed-interval tick that
//! fetches every tracked identity, advances seen-state, and delivers the
//! single globally newest unseen post to its subscribers.
//!
//! Per-tick delivery is capped at one notification on purpose: every
//! identity that produced a newer post has its high-water mark advanced,
//! but only the largest status id across all identities goes out. The
//! rest are treated as seen without ever being announced.

use std::sync::Arc;
use std::time::Duration;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::feed::select::select_latest;
use crate::feed::types::{FeedItem, FeedSource};
use crate::notify::{Deliver, Notification};
use crate::seen::SeenState;
use crate::subscriptions::SubscriptionStore;
use crate::translate::Translator;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_ticks_total", "Completed steady-state poll ticks.");
        describe_counter!(
            "relay_fetch_errors_total",
            "Per-identity feed fetch failures (identity skipped for the tick)."
        );
        describe_counter!(
            "relay_snapshot_errors_total",
            "Subscription snapshot failures (whole tick aborted)."
        );
        describe_counter!(
            "relay_notifications_total",
            "Notifications delivered to at least one tenant."
        );
        describe_counter!(
            "relay_delivery_errors_total",
            "Per-tenant delivery failures."
        );
        describe_counter!(
            "relay_items_parsed_total",
            "Feed items parsed into candidates."
        );
        describe_histogram!("relay_fetch_ms", "Feed fetch time in milliseconds.");
        describe_histogram!("relay_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("relay_last_tick_ts", "Unix ts when the last tick finished.");
    });
}

/// Snapshot resolution failure: the only error that aborts a whole tick.
#[derive(Debug, thiserror::Error)]
#[error("resolving subscription snapshot: {0}")]
pub struct StateResolutionError(#[from] anyhow::Error);

#[derive(Clone, Copy, Debug)]
pub struct RelayCfg {
    pub interval: Duration,
}

/// Owns the collaborators and the seen-state for the single relay task.
/// All mutation happens on that one logical timeline, so there is no
/// locking anywhere in the core.
pub struct Relay {
    store: Arc<dyn SubscriptionStore>,
    source: Arc<dyn FeedSource>,
    translator: Translator,
    delivery: Arc<dyn Deliver>,
    seen: SeenState,
    cfg: RelayCfg,
}

impl Relay {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        source: Arc<dyn FeedSource>,
        translator: Translator,
        delivery: Arc<dyn Deliver>,
        seen: SeenState,
        cfg: RelayCfg,
    ) -> Self {
        Self {
            store,
            source,
            translator,
            delivery,
            seen,
            cfg,
        }
    }

    pub fn seen(&self) -> &SeenState {
        &self.seen
    }

    /// Start-up phase: seed seen-state with whatever each feed currently
    /// shows, emitting nothing. Pre-existing posts are never announced
    /// on (re)start. Identities whose fetch fails stay unseeded; their
    /// first later observation counts as new.
    pub async fn prime(&mut self) {
        let snapshot = match self.store.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                error!(target: "relay", error = %e, "priming snapshot failed, starting unseeded");
                return;
            }
        };

        for identity in snapshot.identities() {
            match self.source.fetch(&identity).await {
                Ok(items) => {
                    if let Some(item) = select_latest(&items) {
                        debug!(target: "relay", identity = %identity, id = %item.id, "primed");
                        let id = item.id.clone();
                        self.seen.record(&identity, id);
                    }
                }
                Err(e) => {
                    warn!(target: "relay", identity = %identity, error = %e, "priming fetch failed");
                }
            }
        }
        info!(target: "relay", identities = self.seen.len(), "seen-state primed");
    }

    /// One steady-state tick. Returns the delivered notification, if
    /// any, so tests can drive the cycle synchronously.
    pub async fn run_tick(&mut self) -> Result<Option<Notification>, StateResolutionError> {
        ensure_metrics_described();

        let snapshot = match self.store.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                counter!("relay_snapshot_errors_total").increment(1);
                return Err(StateResolutionError(e));
            }
        };

        // Winner = the globally largest new status id across identities.
        // Seen-state still advances for every identity with a newer post,
        // including the ones that lose this comparison.
        let mut winner: Option<(String, FeedItem)> = None;

        for identity in snapshot.identities() {
            let t0 = std::time::Instant::now();
            let items = match self.source.fetch(&identity).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(target: "relay", identity = %identity, error = %e, "feed fetch failed, skipping identity this tick");
                    counter!("relay_fetch_errors_total").increment(1);
                    continue;
                }
            };
            histogram!("relay_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            let Some(item) = select_latest(&items) else {
                debug!(target: "relay", identity = %identity, "no candidate items");
                continue;
            };
            if item.text.is_empty() {
                debug!(target: "relay", identity = %identity, id = %item.id, "latest item has no extractable text");
                continue;
            }
            if !self.seen.is_new(&identity, &item.id) {
                continue;
            }

            let item = item.clone();
            self.seen.record(&identity, item.id.clone());

            match &winner {
                Some((_, best)) if best.id >= item.id => {}
                _ => winner = Some((identity, item)),
            }
        }

        let now = chrono::Utc::now().timestamp().max(0) as f64;
        counter!("relay_ticks_total").increment(1);
        gauge!("relay_last_tick_ts").set(now);

        let Some((identity, item)) = winner else {
            return Ok(None);
        };

        let translated = self.translator.translate(&item.text).await;
        let note = Notification {
            identity: identity.clone(),
            id: item.id,
            url: item.url,
            text: item.text,
            translated,
            published_at: item.published_at,
        };

        let tenants = snapshot.tenants_tracking(&identity);
        for tenant in &tenants {
            if let Err(e) = self.delivery.deliver(tenant, &note).await {
                warn!(target: "relay", tenant = %tenant, identity = %identity, error = %e, "delivery failed");
                counter!("relay_delivery_errors_total").increment(1);
            }
        }
        counter!("relay_notifications_total").increment(1);
        info!(target: "relay", identity = %identity, id = %note.id, tenants = tenants.len(), "notification relayed");

        Ok(Some(note))
    }

    /// Run priming, then tick forever at the configured interval. Each
    /// tick is awaited to completion before the next fires, so ticks
    /// never overlap; an overrunning tick delays the schedule instead.
    pub fn spawn(mut self) -> RelayHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            self.prime().await;

            let mut ticker = tokio::time::interval(self.cfg.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick fires immediately; priming just
            // ran, so consume it and start a full period out.
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // A dropped sender counts as shutdown too.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!(target: "relay", "shutdown requested, stopping poll loop");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match self.run_tick().await {
                            Ok(Some(note)) => {
                                debug!(target: "relay", id = %note.id, "tick delivered");
                            }
                            Ok(None) => {
                                debug!(target: "relay", "tick found nothing new");
                            }
                            Err(e) => {
                                error!(target: "relay", error = %e, "tick aborted");
                            }
                        }
                    }
                }
            }
        });

        RelayHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Start/stop handle for the spawned poll loop.
pub struct RelayHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Signal the loop and wait for it to wind down. An in-flight tick
    /// runs to completion first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
