//! pharmadesk: client-side state-consistency layer for a pharmacy point of sale.
//!
//! The crate keeps a cart, a filterable inventory view and a staleness-tracked
//! resource cache consistent with a remote REST backend whose stock counts
//! change as a side effect of checkout.

pub mod api;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod infra;
pub mod inventory;
pub mod sales;
pub mod search;
pub mod session;

pub use pharmadesk_api_types as types;
