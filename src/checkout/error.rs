use thiserror::Error;

use crate::api::ApiError;
use crate::domain::{InvalidStateTransition, StockConflict, ValidationError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    StockConflict(#[from] StockConflict),
    #[error(transparent)]
    Http(#[from] ApiError),
    #[error(transparent)]
    InvalidStateTransition(#[from] InvalidStateTransition),
    #[error("a sale submission is already in flight")]
    SubmissionInFlight,
}

impl CheckoutError {
    /// True when the failure was decided locally, without a request.
    pub fn is_local(&self) -> bool {
        !matches!(self, CheckoutError::Http(_))
    }
}
