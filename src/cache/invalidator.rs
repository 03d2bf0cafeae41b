//! Mutation-driven invalidation.
//!
//! After the backend acknowledges a write, callers invalidate the affected
//! resource family. Matching entries are marked stale, never evicted.

use std::sync::Arc;

use metrics::counter;
use tracing::info;

use super::keys::ResourceKey;

pub(crate) const METRIC_CACHE_INVALIDATED: &str = "pharmadesk_cache_invalidated_total";

/// How a scope token is compared with a key's family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Family must equal the token.
    Exact,
    /// Family equals the token or sits below it at a `/` boundary.
    Family,
}

/// A resource-family token plus the rule used to match keys against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationScope {
    token: String,
    rule: MatchRule,
}

impl InvalidationScope {
    pub fn family(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim_matches('/').to_string(),
            rule: MatchRule::Family,
        }
    }

    pub fn exact(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim_matches('/').to_string(),
            rule: MatchRule::Exact,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn matches(&self, key: &ResourceKey) -> bool {
        match self.rule {
            MatchRule::Exact => key.family() == self.token,
            MatchRule::Family => key.in_family(&self.token),
        }
    }
}

/// Anything holding keyed entries that can be flagged stale.
pub trait StaleMarker: Send + Sync {
    /// Flag every entry matched by `scope`; returns how many matched.
    fn mark_stale(&self, scope: &InvalidationScope) -> usize;
}

/// Marks cache entries stale after acknowledged mutations.
#[derive(Clone)]
pub struct MutationInvalidator {
    target: Arc<dyn StaleMarker>,
}

impl MutationInvalidator {
    pub fn new(target: Arc<dyn StaleMarker>) -> Self {
        Self { target }
    }

    /// Stale every entry of `family` and of the families below it.
    pub fn invalidate(&self, family: &str) -> usize {
        self.invalidate_scope(&InvalidationScope::family(family))
    }

    pub fn invalidate_scope(&self, scope: &InvalidationScope) -> usize {
        let marked = self.target.mark_stale(scope);
        counter!(METRIC_CACHE_INVALIDATED, "family" => scope.token().to_string())
            .increment(marked as u64);
        info!(
            family = scope.token(),
            rule = ?scope.rule,
            marked,
            "Cache family invalidated"
        );
        marked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ResourceCache, keys::family};

    #[test]
    fn invalidate_marks_family_and_children() {
        let cache = Arc::new(ResourceCache::new(&CacheConfig::default()));
        let invalidator = MutationInvalidator::new(cache.clone());

        let all = ResourceKey::new(family::MEDICINES).with_param("page", 1);
        let near = ResourceKey::new(family::MEDICINES_NEAR_EXPIRY).with_param("search", "");
        let sale = ResourceKey::sale(9);
        cache.insert(all.clone(), ());
        cache.insert(near.clone(), ());
        cache.insert(sale.clone(), ());

        assert_eq!(invalidator.invalidate("medicines"), 2);
        assert_eq!(cache.is_stale(&all), Some(true));
        assert_eq!(cache.is_stale(&near), Some(true));
        assert_eq!(cache.is_stale(&sale), Some(false));
    }

    #[test]
    fn exact_scope_ignores_children() {
        let cache = Arc::new(ResourceCache::new(&CacheConfig::default()));
        let invalidator = MutationInvalidator::new(cache.clone());

        let list = ResourceKey::new(family::SALES).with_param("page", 1);
        let detail = ResourceKey::sale(9);
        cache.insert(list.clone(), ());
        cache.insert(detail.clone(), ());

        assert_eq!(invalidator.invalidate_scope(&InvalidationScope::exact("sales")), 1);
        assert_eq!(cache.is_stale(&list), Some(true));
        assert_eq!(cache.is_stale(&detail), Some(false));
    }

    #[test]
    fn invalidating_unknown_family_marks_nothing() {
        let cache = Arc::new(ResourceCache::new(&CacheConfig::default()));
        let invalidator = MutationInvalidator::new(cache.clone());
        cache.insert(ResourceKey::new(family::MEDICINES), ());

        assert_eq!(invalidator.invalidate("suppliers"), 0);
        assert_eq!(cache.is_stale(&ResourceKey::new(family::MEDICINES)), Some(false));
    }
}
