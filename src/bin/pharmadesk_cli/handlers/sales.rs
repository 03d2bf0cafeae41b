#![deny(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use pharmadesk::checkout::RecordingNavigator;
use pharmadesk::sales::{SalesHistory, SalesOrdering, load_sale};
use pharmadesk::types::SaleId;

use crate::args::SalesCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::session::require_admin;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: SalesCmd) -> Result<(), CliError> {
    match cmd {
        SalesCmd::List {
            search,
            ordering,
            page,
        } => list(ctx, search, ordering, page).await,
        SalesCmd::Get { id } => get(ctx, id).await,
        SalesCmd::Cancel { id } => cancel(ctx, id).await,
    }
}

async fn list(
    ctx: &Ctx,
    search: Option<String>,
    ordering: SalesOrdering,
    page: u32,
) -> Result<(), CliError> {
    let mut history = SalesHistory::new();
    if let Some(term) = search {
        history.set_search(term);
    }
    history.set_ordering(ordering);
    history.set_page(page);

    let listing = history.load(&ctx.cache, ctx.backend.as_ref()).await?;
    print_json(listing.as_ref())
}

async fn get(ctx: &Ctx, id: SaleId) -> Result<(), CliError> {
    let sale = load_sale(&ctx.cache, ctx.backend.as_ref(), id).await?;
    print_json(sale.as_ref())
}

async fn cancel(ctx: &Ctx, id: SaleId) -> Result<(), CliError> {
    require_admin(ctx, "cancelling a sale").await?;
    let sale = load_sale(&ctx.cache, ctx.backend.as_ref(), id).await?;
    let coordinator = ctx.checkout(Arc::new(RecordingNavigator::new()));
    let cancelled = coordinator.cancel_sale(&sale).await?;
    print_json(&cancelled)
}
