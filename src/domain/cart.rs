//! Sale cart: a bounded, quantity-adjustable set of line items.
//!
//! Every line holds `1 <= quantity <= stock_ceiling`, where the ceiling mirrors
//! the most recently fetched remote stock figure. A ceiling that drops to zero
//! after a refresh is kept as a conflict and surfaces on the next increase or
//! checkout attempt.

use rust_decimal::Decimal;

use crate::types::{Medicine, MedicineId, SaleCreateRequest, SaleItemRequest};

use super::error::StockConflict;
use super::money::{TAX_RATE, round2};

/// Product as offered for sale, with its currently known stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: MedicineId,
    pub name: String,
    pub unit_price: Decimal,
    pub available_stock: u32,
}

impl From<&Medicine> for Product {
    fn from(medicine: &Medicine) -> Self {
        Self {
            id: medicine.id,
            name: medicine.name.clone(),
            unit_price: medicine.price,
            available_stock: medicine.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: MedicineId,
    pub name: String,
    pub unit_price: Decimal,
    quantity: u32,
    stock_ceiling: u32,
}

impl LineItem {
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn stock_ceiling(&self) -> u32 {
        self.stock_ceiling
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn conflict(&self) -> Option<StockConflict> {
        match self.stock_ceiling {
            0 => Some(StockConflict::out_of_stock(self.product_id, &self.name)),
            ceiling if self.quantity > ceiling => Some(StockConflict::insufficient(ceiling)),
            _ => None,
        }
    }
}

/// Exact cart totals. Use [`Totals::rounded`] for display or submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round2(self.subtotal),
            tax: round2(self.tax),
            total: round2(self.total),
        }
    }
}

/// Customer fields attached to a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.phone.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    pub fn add_item(&mut self, product: &Product) -> Result<(), StockConflict> {
        if product.available_stock == 0 {
            return Err(StockConflict::out_of_stock(product.id, &product.name));
        }

        match self.position(product.id) {
            Some(index) => {
                let item = &mut self.items[index];
                if item.quantity >= product.available_stock {
                    return Err(StockConflict::insufficient(product.available_stock));
                }
                item.stock_ceiling = product.available_stock;
                item.quantity += 1;
            }
            None => self.items.push(LineItem {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.unit_price,
                quantity: 1,
                stock_ceiling: product.available_stock,
            }),
        }
        Ok(())
    }

    /// Set the quantity of an existing line, validated against its current ceiling.
    ///
    /// Absent products are ignored. Values below one clamp to one, and the
    /// clamped value is what gets checked; removal goes through
    /// [`Cart::remove_item`].
    pub fn set_quantity(&mut self, product_id: MedicineId, requested: u32) -> Result<(), StockConflict> {
        let Some(index) = self.position(product_id) else {
            return Ok(());
        };
        let item = &mut self.items[index];
        let quantity = requested.max(1);
        if quantity > item.stock_ceiling {
            return Err(StockConflict::insufficient(item.stock_ceiling));
        }
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: MedicineId) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Refresh ceilings from freshly fetched stock figures.
    ///
    /// Products not in the cart are ignored. A quantity above a new non-zero
    /// ceiling is lowered to it; a zero ceiling is left as a conflict.
    /// Returns the number of lines whose ceiling changed.
    pub fn sync_stock<'a>(&mut self, products: impl IntoIterator<Item = &'a Medicine>) -> usize {
        let mut changed = 0;
        for medicine in products {
            let Some(index) = self.position(medicine.id) else {
                continue;
            };
            let item = &mut self.items[index];
            if item.stock_ceiling != medicine.quantity {
                item.stock_ceiling = medicine.quantity;
                changed += 1;
            }
            if item.stock_ceiling > 0 && item.quantity > item.stock_ceiling {
                item.quantity = item.stock_ceiling;
            }
        }
        changed
    }

    /// Lines that can no longer be sold as they stand.
    pub fn conflicts(&self) -> Vec<(MedicineId, StockConflict)> {
        self.items
            .iter()
            .filter_map(|item| item.conflict().map(|c| (item.product_id, c)))
            .collect()
    }

    pub fn totals(&self) -> Totals {
        let subtotal: Decimal = self.items.iter().map(LineItem::line_total).sum();
        let tax = subtotal * TAX_RATE;
        Totals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Build the submission body for this cart.
    pub fn draft(&self, customer: &Customer) -> SaleCreateRequest {
        SaleCreateRequest {
            customer_name: customer.name.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            items: self
                .items
                .iter()
                .map(|item| SaleItemRequest {
                    medicine_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    pub fn get(&self, product_id: MedicineId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, product_id: MedicineId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id == product_id)
    }
}
