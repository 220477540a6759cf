// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod feed;
pub mod metrics;
pub mod notify;
pub mod relay;
pub mod seen;
pub mod subscriptions;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::feed::types::{FeedItem, FeedSource, FetchError, StatusId};
pub use crate::notify::{Deliver, Notification};
pub use crate::relay::{Relay, RelayCfg, RelayHandle, StateResolutionError};
pub use crate::seen::SeenState;
pub use crate::subscriptions::{SubscriptionSnapshot, SubscriptionStore};
pub use crate::translate::{Translate, TranslationError, Translator};
