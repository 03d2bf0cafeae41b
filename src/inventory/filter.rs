use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use tracing::debug;

use crate::cache::{ResourceKey, family};
use crate::config::InventorySettings;
use crate::search::SearchTarget;

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(50).unwrap();

/// Which slice of the inventory is listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    All,
    LowStock,
    NearExpiry,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::LowStock => "low_stock",
            FilterMode::NearExpiry => "near_expiry",
        }
    }

    pub fn family(self) -> &'static str {
        match self {
            FilterMode::All => family::MEDICINES,
            FilterMode::LowStock => family::MEDICINES_LOW_STOCK,
            FilterMode::NearExpiry => family::MEDICINES_NEAR_EXPIRY,
        }
    }

    pub fn is_paginated(self) -> bool {
        matches!(self, FilterMode::All)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "all" => Ok(FilterMode::All),
            "low_stock" | "low-stock" => Ok(FilterMode::LowStock),
            "near_expiry" | "near-expiry" => Ok(FilterMode::NearExpiry),
            other => Err(format!("unknown filter `{other}`")),
        }
    }
}

/// Filter mode, committed search term and page of the inventory list.
///
/// Page is only meaningful in [`FilterMode::All`]; the other modes list the
/// full filtered set and keep page pinned to 1.
#[derive(Debug, Clone)]
pub struct FilteredPageState {
    mode: FilterMode,
    search_term: String,
    page: u32,
    page_size: NonZeroU32,
    count: Option<u64>,
}

impl Default for FilteredPageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FilteredPageState {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            mode: FilterMode::All,
            search_term: String::new(),
            page: 1,
            page_size,
            count: None,
        }
    }

    pub fn from_settings(settings: &InventorySettings) -> Self {
        Self::new(settings.page_size)
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    /// Switch mode. Page resets even when the mode is unchanged.
    pub fn set_mode(&mut self, mode: FilterMode) {
        debug!(from = %self.mode, to = %mode, "Inventory filter changed");
        self.mode = mode;
        self.page = 1;
        self.count = None;
    }

    /// Adopt a committed search term and return to the first page.
    pub fn commit_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
        self.count = None;
        debug!(term = %self.search_term, "Inventory search committed");
    }

    /// Move to page `page` if allowed. Returns whether it was applied.
    pub fn set_page(&mut self, page: u32) -> bool {
        let total = self.total_pages();
        if !self.mode.is_paginated() || page < 1 || page > total {
            debug!(page, total_pages = total, mode = %self.mode, "Page change ignored");
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Back to all products, no search, first page.
    pub fn clear(&mut self) {
        self.mode = FilterMode::All;
        self.search_term.clear();
        self.page = 1;
        self.count = None;
    }

    /// Record the result count the backend reported for the current key.
    ///
    /// Any mode or search change forgets it, so paging stays disabled until
    /// the new query has answered.
    pub fn observe_count(&mut self, count: u64) {
        self.count = Some(count);
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// `ceil(count / page_size)`, or 0 before any count was observed.
    pub fn total_pages(&self) -> u32 {
        let Some(count) = self.count else {
            return 0;
        };
        let pages = count.div_ceil(u64::from(self.page_size.get()));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Key of the read this state currently describes.
    pub fn resource_key(&self) -> ResourceKey {
        let key =
            ResourceKey::new(self.mode.family()).with_param("search", self.search_term.as_str());
        if self.mode.is_paginated() {
            key.with_param("page", self.page)
        } else {
            key
        }
    }
}

impl SearchTarget for FilteredPageState {
    fn adopt_search(&mut self, term: String) {
        self.commit_search(term);
    }
}
