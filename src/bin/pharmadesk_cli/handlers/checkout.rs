#![deny(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use pharmadesk::checkout::{RecordingNavigator, SubmitOutcome};
use pharmadesk::domain::money::format_usd;
use pharmadesk::inventory::FilteredPageState;
use pharmadesk::types::MedicineId;
use serde_json::json;
use tracing::info;

use crate::args::CheckoutArgs;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: CheckoutArgs) -> Result<(), CliError> {
    let ids: Vec<MedicineId> = cmd.items.iter().map(|item| item.medicine_id).collect();
    let view = ctx.inventory(FilteredPageState::from_settings(&ctx.settings.inventory));
    let products = view.find_products(&ids).await?;

    let navigator = Arc::new(RecordingNavigator::new());
    let coordinator = ctx.checkout(Arc::clone(&navigator));

    for item in &cmd.items {
        let product = products
            .get(&item.medicine_id)
            .ok_or_else(|| CliError::NotFound(format!("medicine {}", item.medicine_id)))?;
        let already = coordinator
            .cart()
            .get(item.medicine_id)
            .map_or(0, pharmadesk::domain::LineItem::quantity);
        let quantity = already.checked_add(item.quantity).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "quantity for medicine {} is too large",
                item.medicine_id
            ))
        })?;
        if already == 0 {
            coordinator.add_item(product)?;
        }
        coordinator.set_quantity(item.medicine_id, quantity)?;
    }
    coordinator.set_customer_name(cmd.customer_name)?;
    coordinator.set_customer_phone(cmd.customer_phone)?;

    let totals = coordinator.totals().rounded();
    info!(
        subtotal = %format_usd(totals.subtotal),
        tax = %format_usd(totals.tax),
        total = %format_usd(totals.total),
        "Submitting checkout"
    );

    match coordinator.submit().await? {
        SubmitOutcome::Completed { sale, route } => print_json(&json!({
            "navigate_to": route.path(),
            "sale": sale,
        })),
        SubmitOutcome::Ignored => Err(CliError::InvalidInput(
            "a submission is already in flight".into(),
        )),
    }
}
