//! Wire types shared by the pharmadesk client layer and its command-line tool.
//!
//! Shapes mirror the JSON served by the inventory/sales REST API. Money
//! fields are `Decimal` and travel as strings; timestamps are RFC 3339.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub type MedicineId = i64;
pub type SaleId = i64;

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap an unpaginated result set in a single-page envelope.
    pub fn single(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Either a paginated envelope or a bare array.
///
/// The filtered medicine endpoints return the full result set and some
/// deployments serve it without the envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Paginated(Paginated<T>),
    Bare(Vec<T>),
}

impl<T> From<ListBody<T>> for Paginated<T> {
    fn from(body: ListBody<T>) -> Self {
        match body {
            ListBody::Paginated(page) => page,
            ListBody::Bare(results) => Paginated::single(results),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(with = "iso_date")]
    pub expiry_date: Date,
    #[serde(default)]
    pub is_low_stock: bool,
    #[serde(default)]
    pub is_near_expiry: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

pub type MedicinePage = Paginated<Medicine>;

/// Body of `POST /api/medicines/` and `PUT /api/medicines/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineWriteRequest {
    pub name: String,
    pub category: Option<i64>,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(with = "iso_date")]
    pub expiry_date: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: i64,
    pub medicine: MedicineId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// A recorded sale. List responses omit `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: SaleStatus,
    pub created_by: i64,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub type SalePage = Paginated<Sale>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub medicine_id: MedicineId,
    pub quantity: u32,
}

/// Body of `POST /api/sales/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCreateRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<SaleItemRequest>,
}

/// Response of `GET /api/auth/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardTrends {
    pub revenue_change: f64,
    pub transactions_change: f64,
}

/// Response of `GET /api/dashboard/stats/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_sales: u64,
    pub revenue: f64,
    pub transactions: u64,
    pub low_stock_count: u64,
    pub near_expiry_count: u64,
    pub cancelled_transactions: u64,
    pub trends: DashboardTrends,
}
