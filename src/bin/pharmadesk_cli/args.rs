//! Command-line surface for `pharmadesk-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pharmadesk::config::ConfigArgs;
use pharmadesk::inventory::FilterMode;
use pharmadesk::sales::SalesOrdering;
use pharmadesk::types::{MedicineId, SaleId};
use rust_decimal::Decimal;
use time::Date;
use time::macros::format_description;

#[derive(Parser, Debug)]
#[command(
    name = "pharmadesk-cli",
    version,
    about = "Pharmacy point-of-sale client",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Path to file containing the API token (takes precedence over env)
    #[arg(long, env = "PHARMADESK_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// API token from env (CLI flag intentionally disabled to avoid shell history leaks)
    #[arg(hide = true, env = "PHARMADESK_TOKEN")]
    pub token_env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session inspection
    Session(SessionArgs),
    /// Inventory browsing and medicine management
    Medicines(MedicinesArgs),
    /// Sale history, detail and cancellation
    Sales(SalesArgs),
    /// Submit a sale from a list of items
    Checkout(CheckoutArgs),
    /// Dashboard statistics
    Dashboard,
}

#[derive(Parser, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionCmd,
}

#[derive(Subcommand, Debug)]
pub enum SessionCmd {
    /// Show the authenticated user, if any
    Me,
}

#[derive(Parser, Debug)]
pub struct MedicinesArgs {
    #[command(subcommand)]
    pub action: MedicinesCmd,
}

#[derive(Subcommand, Debug)]
pub enum MedicinesCmd {
    /// List medicines
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Create a medicine
    Create(MedicineFields),
    /// Replace all fields of a medicine
    Update {
        #[arg(long)]
        id: MedicineId,
        #[command(flatten)]
        fields: MedicineFields,
    },
    /// Delete a medicine
    Delete {
        #[arg(long)]
        id: MedicineId,
    },
}

#[derive(Args, Debug, Clone)]
pub struct MedicineFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: Option<i64>,
    #[arg(long)]
    pub quantity: u32,
    /// Unit price, e.g. 5.99
    #[arg(long)]
    pub price: Decimal,
    /// Expiry date as YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub expiry_date: Date,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterArg {
    All,
    LowStock,
    NearExpiry,
}

impl From<FilterArg> for FilterMode {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => FilterMode::All,
            FilterArg::LowStock => FilterMode::LowStock,
            FilterArg::NearExpiry => FilterMode::NearExpiry,
        }
    }
}

#[derive(Parser, Debug)]
pub struct SalesArgs {
    #[command(subcommand)]
    pub action: SalesCmd,
}

#[derive(Subcommand, Debug)]
pub enum SalesCmd {
    /// List sales
    List {
        #[arg(long)]
        search: Option<String>,
        /// One of -created_at, created_at, -total, total
        #[arg(long, default_value = "-created_at", allow_hyphen_values = true)]
        ordering: SalesOrdering,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one sale with its items
    Get { id: SaleId },
    /// Cancel a completed sale (admin only)
    Cancel { id: SaleId },
}

#[derive(Parser, Debug)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub customer_name: String,
    #[arg(long)]
    pub customer_phone: String,
    /// Item as MEDICINE_ID or MEDICINE_ID:QUANTITY; repeatable
    #[arg(long = "item", required = true, value_name = "ID[:QTY]")]
    pub items: Vec<ItemSpec>,
}

/// One `--item` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    pub medicine_id: MedicineId,
    pub quantity: u32,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = match value.split_once(':') {
            Some((id, qty)) => (id, qty),
            None => (value, "1"),
        };
        let medicine_id = id
            .trim()
            .parse()
            .map_err(|e| format!("invalid medicine id `{id}`: {e}"))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|e| format!("invalid quantity `{quantity}`: {e}"))?;
        if quantity == 0 {
            return Err("quantity must be at least 1".into());
        }
        Ok(Self {
            medicine_id,
            quantity,
        })
    }
}

pub fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date `{value}` (expected YYYY-MM-DD): {e}"))
}
