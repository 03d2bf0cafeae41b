//! Sale submission flow.
//!
//! `Idle -> Validating -> Submitting -> {Success, Failed}`. The cart and the
//! customer fields live here so that edits can be refused while a submission
//! is in flight. Locks are never held across a request.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::Backend;
use crate::cache::lock::mutex_lock;
use crate::cache::{MutationInvalidator, family};
use crate::domain::sale::cancelled;
use crate::domain::{Cart, Customer, Product, Totals, ValidationError};
use crate::types::{Medicine, MedicineId, Sale};

use super::error::CheckoutError;
use super::navigator::{Navigator, Route};

const SOURCE: &str = "checkout::coordinator";

pub const METRIC_CHECKOUT_SUBMIT_MS: &str = "pharmadesk_checkout_submit_ms";

const ABANDONED: &str = "submission abandoned before the backend answered";

/// Families refreshed after a sale is accepted, in invalidation order.
const CHECKOUT_INVALIDATES: [&str; 3] = [family::MEDICINES, family::SALES, family::DASHBOARD];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend accepted the sale; caches were invalidated and the
    /// navigator was sent to the summary.
    Completed { sale: Sale, route: Route },
    /// A submission was already in flight; nothing happened.
    Ignored,
}

#[derive(Debug)]
struct CheckoutState {
    phase: CheckoutPhase,
    cart: Cart,
    customer: Customer,
    last_error: Option<String>,
    submission: Option<Uuid>,
}

pub struct CheckoutCoordinator {
    state: Mutex<CheckoutState>,
    backend: Arc<dyn Backend>,
    invalidator: MutationInvalidator,
    navigator: Arc<dyn Navigator>,
}

impl CheckoutCoordinator {
    pub fn new(
        backend: Arc<dyn Backend>,
        invalidator: MutationInvalidator,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            state: Mutex::new(CheckoutState {
                phase: CheckoutPhase::Idle,
                cart: Cart::new(),
                customer: Customer::default(),
                last_error: None,
                submission: None,
            }),
            backend,
            invalidator,
            navigator,
        }
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.lock("phase").phase
    }

    /// Message of the last failed submission, until the next user action.
    pub fn last_error(&self) -> Option<String> {
        self.lock("last_error").last_error.clone()
    }

    pub fn cart(&self) -> Cart {
        self.lock("cart").cart.clone()
    }

    pub fn customer(&self) -> Customer {
        self.lock("customer").customer.clone()
    }

    pub fn totals(&self) -> Totals {
        self.lock("totals").cart.totals()
    }

    pub fn add_item(&self, product: &Product) -> Result<(), CheckoutError> {
        self.edit("add_item", |state| Ok(state.cart.add_item(product)?))
    }

    pub fn set_quantity(&self, product_id: MedicineId, quantity: u32) -> Result<(), CheckoutError> {
        self.edit("set_quantity", |state| {
            Ok(state.cart.set_quantity(product_id, quantity)?)
        })
    }

    pub fn remove_item(&self, product_id: MedicineId) -> Result<(), CheckoutError> {
        self.edit("remove_item", |state| {
            state.cart.remove_item(product_id);
            Ok(())
        })
    }

    pub fn set_customer_name(&self, name: impl Into<String>) -> Result<(), CheckoutError> {
        let name = name.into();
        self.edit("set_customer_name", |state| {
            state.customer.name = name;
            Ok(())
        })
    }

    pub fn set_customer_phone(&self, phone: impl Into<String>) -> Result<(), CheckoutError> {
        let phone = phone.into();
        self.edit("set_customer_phone", |state| {
            state.customer.phone = phone;
            Ok(())
        })
    }

    /// Refresh cart stock ceilings from freshly fetched medicines.
    pub fn sync_stock<'a>(
        &self,
        medicines: impl IntoIterator<Item = &'a Medicine>,
    ) -> Result<usize, CheckoutError> {
        self.edit("sync_stock", |state| Ok(state.cart.sync_stock(medicines)))
    }

    /// Drop the cart and customer fields.
    pub fn abandon(&self) -> Result<(), CheckoutError> {
        self.edit("abandon", |state| {
            state.cart.clear();
            state.customer.clear();
            Ok(())
        })
    }

    /// Validate and submit the current cart as a sale.
    ///
    /// Local failures never reach the network. A backend rejection leaves
    /// the cart and customer fields untouched; there is no automatic retry.
    pub async fn submit(&self) -> Result<SubmitOutcome, CheckoutError> {
        let (draft, submission) = {
            let mut state = self.lock("submit.begin");
            if state.phase == CheckoutPhase::Submitting {
                debug!(submission = ?state.submission, "Submit ignored; already submitting");
                return Ok(SubmitOutcome::Ignored);
            }

            state.phase = CheckoutPhase::Validating;
            if let Err(err) = validate(&state.cart, &state.customer) {
                debug!(error = %err, "Checkout validation failed");
                state.phase = CheckoutPhase::Failed;
                state.last_error = Some(err.to_string());
                return Err(err);
            }

            let submission = Uuid::new_v4();
            state.phase = CheckoutPhase::Submitting;
            state.last_error = None;
            state.submission = Some(submission);
            (state.cart.draft(&state.customer), submission)
        };

        info!(%submission, items = draft.items.len(), "Submitting sale");
        let in_flight = InFlight {
            coordinator: self,
            submission,
            settled: false,
        };
        let started = Instant::now();
        let result = self.backend.create_sale(&draft).await;
        in_flight.settle();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(sale) => {
                histogram!(METRIC_CHECKOUT_SUBMIT_MS, "outcome" => "accepted").record(elapsed_ms);
                for family in CHECKOUT_INVALIDATES {
                    self.invalidator.invalidate(family);
                }
                {
                    let mut state = self.lock("submit.accepted");
                    state.cart.clear();
                    state.customer.clear();
                    state.phase = CheckoutPhase::Success;
                    state.submission = None;
                }

                let route = Route::SaleSummary(sale.id);
                info!(%submission, sale_id = sale.id, total = %sale.total, "Sale accepted");
                self.navigator.navigate(route);
                Ok(SubmitOutcome::Completed { sale, route })
            }
            Err(err) => {
                histogram!(METRIC_CHECKOUT_SUBMIT_MS, "outcome" => "rejected").record(elapsed_ms);
                warn!(%submission, error = %err, "Sale rejected");
                let mut state = self.lock("submit.rejected");
                state.phase = CheckoutPhase::Failed;
                state.last_error = Some(err.to_string());
                state.submission = None;
                Err(err.into())
            }
        }
    }

    /// Cancel a completed sale.
    ///
    /// Independent of the submission phases. An already-cancelled sale fails
    /// locally, with no request and no invalidation.
    pub async fn cancel_sale(&self, sale: &Sale) -> Result<Sale, CheckoutError> {
        let updated = cancelled(sale)?;
        self.backend.cancel_sale(sale.id).await?;
        self.invalidator.invalidate(family::SALES);
        info!(sale_id = sale.id, "Sale cancelled");
        Ok(updated)
    }

    /// Leave `Submitting` for a submission whose future was dropped mid-request.
    ///
    /// The backend may or may not have recorded the sale, so the checkout
    /// families are refreshed as if it had; cart and customer are kept.
    fn abandon_submission(&self, submission: Uuid) {
        {
            let mut state = self.lock("submit.abandoned");
            if state.phase != CheckoutPhase::Submitting || state.submission != Some(submission) {
                return;
            }
            state.phase = CheckoutPhase::Failed;
            state.last_error = Some(ABANDONED.to_string());
            state.submission = None;
        }
        warn!(%submission, "Sale submission dropped before completion");
        for family in CHECKOUT_INVALIDATES {
            self.invalidator.invalidate(family);
        }
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, CheckoutState> {
        mutex_lock(&self.state, SOURCE, op)
    }

    fn edit<R>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut CheckoutState) -> Result<R, CheckoutError>,
    ) -> Result<R, CheckoutError> {
        let mut state = self.lock(op);
        match state.phase {
            CheckoutPhase::Submitting => return Err(CheckoutError::SubmissionInFlight),
            CheckoutPhase::Success | CheckoutPhase::Failed => {
                state.phase = CheckoutPhase::Idle;
                state.last_error = None;
            }
            CheckoutPhase::Idle | CheckoutPhase::Validating => {}
        }
        apply(&mut state)
    }
}

/// Armed while `create_sale` is awaited; dropping it unsettled abandons the
/// submission.
struct InFlight<'a> {
    coordinator: &'a CheckoutCoordinator,
    submission: Uuid,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.abandon_submission(self.submission);
        }
    }
}

fn validate(cart: &Cart, customer: &Customer) -> Result<(), CheckoutError> {
    if customer.name.trim().is_empty() {
        return Err(ValidationError::MissingCustomerName.into());
    }
    if customer.phone.trim().is_empty() {
        return Err(ValidationError::MissingCustomerPhone.into());
    }
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }
    if let Some((_, conflict)) = cart.conflicts().into_iter().next() {
        return Err(conflict.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests;
