//! Domain layer types and invariants.

pub mod cart;
pub mod error;
pub mod money;
pub mod sale;

pub use cart::{Cart, Customer, LineItem, Product, Totals};
pub use error::{InvalidStateTransition, StockConflict, ValidationError};
