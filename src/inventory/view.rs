use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::api::{ApiError, Backend};
use crate::cache::{Cached, MutationInvalidator, ResourceCache, ResourceKey, family};
use crate::domain::{Cart, Product};
use crate::search::SearchInput;
use crate::types::{Medicine, MedicineId, MedicinePage, MedicineWriteRequest};

use super::filter::{FilterMode, FilteredPageState};

/// Inventory list reader mounted on the shared cache.
///
/// Owns the list's [`FilteredPageState`] and the debounced search box that
/// feeds it; every read goes through the [`ResourceCache`] under the key that
/// state resolves to.
pub struct InventoryView {
    state: FilteredPageState,
    search: SearchInput,
    cache: Arc<ResourceCache>,
    backend: Arc<dyn Backend>,
    invalidator: MutationInvalidator,
}

impl InventoryView {
    pub fn new(
        state: FilteredPageState,
        cache: Arc<ResourceCache>,
        backend: Arc<dyn Backend>,
        invalidator: MutationInvalidator,
    ) -> Self {
        Self {
            state,
            search: SearchInput::default(),
            cache,
            backend,
            invalidator,
        }
    }

    /// Replace the search quiet interval. Any pending input is discarded.
    #[must_use]
    pub fn with_search_debounce(mut self, interval: Duration) -> Self {
        self.search = SearchInput::new(interval);
        self
    }

    /// Raw search box input; committed once the quiet interval passes.
    pub fn search_input(&mut self, raw: impl Into<String>) {
        self.search.input(raw);
    }

    /// Adopt a search commit that has already fired. The page resets to 1.
    pub fn apply_search(&mut self) -> bool {
        self.search.apply_ready(&mut self.state)
    }

    /// Wait for pending search input to commit, then adopt it.
    pub async fn settle_search(&mut self) -> bool {
        self.search.apply_next(&mut self.state).await
    }

    pub fn state(&self) -> &FilteredPageState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FilteredPageState {
        &mut self.state
    }

    /// Read the page the current state describes and record its count.
    pub async fn load(&mut self) -> Result<Arc<MedicinePage>, ApiError> {
        let key = self.state.resource_key();
        let page = read_page(&self.cache, self.backend.as_ref(), &key).await?;
        self.state.observe_count(page.count);
        debug!(key = %key, count = page.count, shown = page.results.len(), "Inventory page loaded");
        Ok(page)
    }

    /// Whatever is cached for the current key, stale or not.
    pub fn peek(&self) -> Option<Cached<MedicinePage>> {
        self.cache.peek(&self.state.resource_key())
    }

    /// Refresh cart stock ceilings from the cached current page.
    pub fn sync_cart(&self, cart: &mut Cart) -> usize {
        match self.peek() {
            Some(page) => cart.sync_stock(page.data.results.iter()),
            None => 0,
        }
    }

    /// Resolve products by id from the unfiltered listing.
    ///
    /// Walks pages (through the cache) until every id is found or the listing
    /// ends. Ids that do not exist are absent from the result. The view's own
    /// state is left untouched.
    pub async fn find_products(
        &self,
        ids: &[MedicineId],
    ) -> Result<BTreeMap<MedicineId, Product>, ApiError> {
        let mut found = BTreeMap::new();
        let mut page_number = 1_u32;
        while found.len() < ids.len() {
            let key = ResourceKey::new(family::MEDICINES)
                .with_param("search", "")
                .with_param("page", page_number);
            let page = read_page(&self.cache, self.backend.as_ref(), &key).await?;
            for medicine in page.results.iter().filter(|m| ids.contains(&m.id)) {
                found.insert(medicine.id, Product::from(medicine));
            }
            if !page.has_next() {
                break;
            }
            page_number += 1;
        }
        Ok(found)
    }

    pub async fn create_medicine(&self, body: &MedicineWriteRequest) -> Result<Medicine, ApiError> {
        let created = self.backend.create_medicine(body).await?;
        info!(medicine_id = created.id, name = %created.name, "Medicine created");
        self.after_write();
        Ok(created)
    }

    pub async fn update_medicine(
        &self,
        id: MedicineId,
        body: &MedicineWriteRequest,
    ) -> Result<Medicine, ApiError> {
        let updated = self.backend.update_medicine(id, body).await?;
        info!(medicine_id = id, "Medicine updated");
        self.after_write();
        Ok(updated)
    }

    pub async fn delete_medicine(&self, id: MedicineId) -> Result<(), ApiError> {
        self.backend.delete_medicine(id).await?;
        info!(medicine_id = id, "Medicine deleted");
        self.after_write();
        Ok(())
    }

    fn after_write(&self) {
        self.invalidator.invalidate(family::MEDICINES);
        self.invalidator.invalidate(family::DASHBOARD);
    }

    pub fn mode(&self) -> FilterMode {
        self.state.mode()
    }
}

async fn read_page(
    cache: &ResourceCache,
    backend: &dyn Backend,
    key: &ResourceKey,
) -> Result<Arc<MedicinePage>, ApiError> {
    cache.read(key, || backend.list_medicines(key)).await
}
