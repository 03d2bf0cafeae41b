//! pharmadesk-cli: headless client for the pharmacy point-of-sale backend.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod print;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{checkout, dashboard, medicines, sales, session};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = pharmadesk::config::load(&cli.config)?;
    pharmadesk::infra::telemetry::init(&settings.logging)?;
    let ctx = build_ctx_from_cli(&cli, settings)?;

    match cli.command {
        Commands::Session(cmd) => session::handle(&ctx, cmd).await?,
        Commands::Medicines(cmd) => medicines::handle(&ctx, cmd.action).await?,
        Commands::Sales(cmd) => sales::handle(&ctx, cmd.action).await?,
        Commands::Checkout(cmd) => checkout::handle(&ctx, cmd).await?,
        Commands::Dashboard => dashboard::handle(&ctx).await?,
    }

    Ok(())
}
