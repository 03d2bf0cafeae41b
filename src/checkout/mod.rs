//! Checkout: cart submission, post-sale invalidation and sale cancellation.

mod coordinator;
mod error;
mod navigator;

pub use coordinator::{CheckoutCoordinator, CheckoutPhase, METRIC_CHECKOUT_SUBMIT_MS, SubmitOutcome};
pub use error::CheckoutError;
pub use navigator::{Navigator, RecordingNavigator, Route};
