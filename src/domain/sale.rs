//! Sale lifecycle: `completed -> cancelled`, nothing else.

use crate::types::{Sale, SaleStatus};

use super::error::InvalidStateTransition;

/// Next status after a cancellation request.
pub fn cancel_transition(from: SaleStatus) -> Result<SaleStatus, InvalidStateTransition> {
    match from {
        SaleStatus::Completed => Ok(SaleStatus::Cancelled),
        SaleStatus::Cancelled => Err(InvalidStateTransition {
            from,
            to: SaleStatus::Cancelled,
        }),
    }
}

/// Copy of `sale` in the cancelled state, if the transition is allowed.
pub fn cancelled(sale: &Sale) -> Result<Sale, InvalidStateTransition> {
    let status = cancel_transition(sale.status)?;
    Ok(Sale {
        status,
        ..sale.clone()
    })
}
