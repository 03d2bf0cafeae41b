//! Session resource cache.
//!
//! - [`ResourceCache`]: keyed store of fetched API results with staleness
//!   tracking and a logical fetch clock.
//! - [`MutationInvalidator`]: marks entries of a resource family stale after
//!   the backend acknowledges a write.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 256
//! ```

mod config;
mod invalidator;
mod keys;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use invalidator::{InvalidationScope, MatchRule, MutationInvalidator, StaleMarker};
pub use keys::{ResourceKey, family};
pub use store::{Cached, ResourceCache, Tick};

pub(crate) use invalidator::METRIC_CACHE_INVALIDATED;
pub(crate) use store::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STALE_REFETCH};
