//! Inventory list state and its cache-backed reader.

mod filter;
mod view;

pub use filter::{DEFAULT_PAGE_SIZE, FilterMode, FilteredPageState};
pub use view::InventoryView;
