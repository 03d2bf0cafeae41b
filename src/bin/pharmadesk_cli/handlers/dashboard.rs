#![deny(clippy::all, clippy::pedantic)]

use pharmadesk::cache::ResourceKey;

use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx) -> Result<(), CliError> {
    let backend = ctx.backend.as_ref();
    let stats = ctx
        .cache
        .read(&ResourceKey::dashboard_stats(), || backend.dashboard_stats())
        .await?;
    print_json(stats.as_ref())
}
