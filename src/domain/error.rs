use thiserror::Error;

use crate::types::{MedicineId, SaleStatus};

/// Stock conflicts detected locally, before any network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockConflict {
    #[error("`{name}` is out of stock")]
    OutOfStock { product_id: MedicineId, name: String },
    #[error("only {available} in stock")]
    InsufficientStock { available: u32 },
}

impl StockConflict {
    pub fn out_of_stock(product_id: MedicineId, name: impl Into<String>) -> Self {
        Self::OutOfStock {
            product_id,
            name: name.into(),
        }
    }

    pub fn insufficient(available: u32) -> Self {
        Self::InsufficientStock { available }
    }
}

/// Local precondition failures that block a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("customer name is required")]
    MissingCustomerName,
    #[error("customer phone is required")]
    MissingCustomerPhone,
    #[error("cart is empty")]
    EmptyCart,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move sale from `{}` to `{}`", .from.as_str(), .to.as_str())]
pub struct InvalidStateTransition {
    pub from: SaleStatus,
    pub to: SaleStatus,
}
