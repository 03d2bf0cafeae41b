#![deny(clippy::all, clippy::pedantic)]

use pharmadesk::inventory::{FilterMode, FilteredPageState};
use pharmadesk::types::{MedicineId, MedicineWriteRequest};
use serde_json::json;

use crate::args::{MedicineFields, MedicinesCmd};
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: MedicinesCmd) -> Result<(), CliError> {
    match cmd {
        MedicinesCmd::List {
            filter,
            search,
            page,
        } => list(ctx, filter.into(), search, page).await,
        MedicinesCmd::Create(fields) => create(ctx, fields).await,
        MedicinesCmd::Update { id, fields } => update(ctx, id, fields).await,
        MedicinesCmd::Delete { id } => delete(ctx, id).await,
    }
}

async fn list(
    ctx: &Ctx,
    mode: FilterMode,
    search: Option<String>,
    page: u32,
) -> Result<(), CliError> {
    let mut view = ctx.inventory(FilteredPageState::from_settings(&ctx.settings.inventory));
    view.state_mut().set_mode(mode);
    if let Some(term) = search {
        view.state_mut().commit_search(term);
    }

    // The page bound is only known once the first page reports its count.
    let mut listing = view.load().await?;
    if page > 1 {
        if !view.state_mut().set_page(page) {
            return Err(CliError::InvalidInput(format!(
                "page {page} is out of range (1..={}) for filter `{mode}`",
                view.state().total_pages().max(1)
            )));
        }
        listing = view.load().await?;
    }

    let state = view.state();
    print_json(&json!({
        "filter": mode.as_str(),
        "search": state.search_term(),
        "page": state.page(),
        "total_pages": state.total_pages(),
        "count": listing.count,
        "results": listing.results,
    }))
}

async fn create(ctx: &Ctx, fields: MedicineFields) -> Result<(), CliError> {
    let view = ctx.inventory(FilteredPageState::default());
    let created = view.create_medicine(&write_request(fields)).await?;
    print_json(&created)
}

async fn update(ctx: &Ctx, id: MedicineId, fields: MedicineFields) -> Result<(), CliError> {
    let view = ctx.inventory(FilteredPageState::default());
    let updated = view.update_medicine(id, &write_request(fields)).await?;
    print_json(&updated)
}

async fn delete(ctx: &Ctx, id: MedicineId) -> Result<(), CliError> {
    let view = ctx.inventory(FilteredPageState::default());
    view.delete_medicine(id).await?;
    println!("deleted");
    Ok(())
}

fn write_request(fields: MedicineFields) -> MedicineWriteRequest {
    MedicineWriteRequest {
        name: fields.name,
        category: fields.category,
        quantity: fields.quantity,
        price: fields.price,
        expiry_date: fields.expiry_date,
    }
}
