use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiError, Backend};
use crate::cache::{ResourceCache, ResourceKey, family};
use crate::search::SearchTarget;
use crate::types::{Sale, SaleId, SalePage};

/// Sort order accepted by the sale history endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SalesOrdering {
    #[default]
    NewestFirst,
    OldestFirst,
    HighestTotal,
    LowestTotal,
}

impl SalesOrdering {
    pub fn as_param(self) -> &'static str {
        match self {
            SalesOrdering::NewestFirst => "-created_at",
            SalesOrdering::OldestFirst => "created_at",
            SalesOrdering::HighestTotal => "-total",
            SalesOrdering::LowestTotal => "total",
        }
    }
}

impl fmt::Display for SalesOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SalesOrdering {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "-created_at" => Ok(SalesOrdering::NewestFirst),
            "created_at" => Ok(SalesOrdering::OldestFirst),
            "-total" => Ok(SalesOrdering::HighestTotal),
            "total" => Ok(SalesOrdering::LowestTotal),
            other => Err(format!(
                "unknown ordering `{other}` (expected -created_at, created_at, -total or total)"
            )),
        }
    }
}

/// Search, ordering and page of the sale history list.
///
/// Changing the search or the ordering returns to the first page.
#[derive(Debug, Clone)]
pub struct SalesHistory {
    search: String,
    ordering: SalesOrdering,
    page: u32,
}

impl Default for SalesHistory {
    fn default() -> Self {
        Self {
            search: String::new(),
            ordering: SalesOrdering::default(),
            page: 1,
        }
    }
}

impl SalesHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn ordering(&self) -> SalesOrdering {
        self.ordering
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_ordering(&mut self, ordering: SalesOrdering) {
        self.ordering = ordering;
        self.page = 1;
    }

    /// Pages below 1 are clamped to 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(family::SALES)
            .with_param("search", self.search.as_str())
            .with_param("ordering", self.ordering.as_param())
            .with_param("page", self.page)
    }

    pub async fn load(
        &self,
        cache: &ResourceCache,
        backend: &dyn Backend,
    ) -> Result<Arc<SalePage>, ApiError> {
        let key = self.resource_key();
        let page = cache.read(&key, || backend.list_sales(&key)).await?;
        debug!(key = %key, count = page.count, "Sale history loaded");
        Ok(page)
    }
}

impl SearchTarget for SalesHistory {
    fn adopt_search(&mut self, term: String) {
        self.set_search(term);
    }
}

/// Sale detail read, cached under `sales/{id}`.
pub async fn load_sale(
    cache: &ResourceCache,
    backend: &dyn Backend,
    id: SaleId,
) -> Result<Arc<Sale>, ApiError> {
    cache
        .read(&ResourceKey::sale(id), || backend.get_sale(id))
        .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::MockServer;

    use super::*;
    use crate::api::HttpBackend;
    use crate::cache::{CacheConfig, InvalidationScope, StaleMarker};
    use crate::session::StaticSession;

    const SALE: &str = r#"{
        "id": 42, "customer_name": "Ada", "customer_phone": "555-0100",
        "items": [{"id": 1, "medicine": 1, "name": "Aspirin", "price": "5.99", "quantity": 2, "line_total": "11.98"}],
        "subtotal": "11.98", "tax": "1.20", "total": "13.18",
        "status": "completed", "created_by": 3, "created_by_username": "clerk",
        "created_at": "2025-01-15T10:30:00Z"
    }"#;

    #[test]
    fn ordering_and_search_reset_page() {
        let mut history = SalesHistory::new();
        history.set_page(4);
        history.set_ordering(SalesOrdering::HighestTotal);
        assert_eq!(history.page(), 1);

        history.set_page(3);
        history.set_search("ada");
        assert_eq!(history.page(), 1);

        let key = history.resource_key();
        assert_eq!(key.param("ordering"), Some("-total"));
        assert_eq!(key.param("search"), Some("ada"));
        assert_eq!(key.param("page"), Some("1"));
    }

    #[test]
    fn ordering_parses_wire_values() {
        assert_eq!("created_at".parse::<SalesOrdering>(), Ok(SalesOrdering::OldestFirst));
        assert_eq!("-created_at".parse::<SalesOrdering>(), Ok(SalesOrdering::NewestFirst));
        assert!("price".parse::<SalesOrdering>().is_err());
    }

    #[tokio::test]
    async fn sale_detail_is_cached_under_its_own_key() -> Result<(), ApiError> {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/api/sales/42/");
            then.status(200)
                .header("content-type", "application/json")
                .body(SALE);
        });
        let backend = HttpBackend::new(&server.base_url(), Arc::new(StaticSession::new("t")))?;
        let cache = ResourceCache::new(&CacheConfig::default());

        let first = load_sale(&cache, &backend, 42).await?;
        let again = load_sale(&cache, &backend, 42).await?;
        mock.assert();
        assert_eq!(first.items.len(), 1);
        assert!(Arc::ptr_eq(&first, &again));

        cache.mark_stale(&InvalidationScope::family(family::SALES));
        assert_eq!(cache.is_stale(&ResourceKey::sale(42)), Some(true));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_resets_history_page() {
        let mut history = SalesHistory::new();
        history.set_ordering(SalesOrdering::HighestTotal);
        history.set_page(4);
        let mut input = crate::search::SearchInput::new(Duration::from_millis(500));

        input.input("Ad");
        input.input("Ada");
        assert!(input.apply_next(&mut history).await);

        assert_eq!(history.search(), "Ada");
        assert_eq!(history.page(), 1);
        assert_eq!(history.ordering(), SalesOrdering::HighestTotal);
        assert_eq!(history.resource_key().param("search"), Some("Ada"));
    }
}
