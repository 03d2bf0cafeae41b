//! Sale history list state and sale detail reads.

mod history;

pub use history::{SalesHistory, SalesOrdering, load_sale};
