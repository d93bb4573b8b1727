use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult, Entity, Money, ProductId, SupplierId};

/// Stock level below which a product counts as low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 10;

/// Unit of sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Liter,
    #[default]
    Piece,
    Box,
    Carton,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Liter => "liter",
            Unit::Piece => "piece",
            Unit::Box => "box",
            Unit::Carton => "carton",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim and upper-case a SKU.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn required(field: &'static str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

fn non_negative_price(price: Money) -> DomainResult<Money> {
    if price.is_negative() {
        return Err(DomainError::validation("price", "price cannot be negative"));
    }
    Ok(price)
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category: String,
    #[serde(default)]
    pub unit: Unit,
    pub price: Money,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
}

/// Partial update. SKU and stock are not editable through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<Unit>,
    pub price: Option<Money>,
    pub supplier_id: Option<SupplierId>,
}

/// Catalog product.
///
/// `current_stock` is a cached value: order workflows move it directly and
/// batch mutations overwrite it with the sum of the product's batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    sku: String,
    category: String,
    unit: Unit,
    price: Money,
    current_stock: u64,
    supplier_id: Option<SupplierId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    /// Validate and build a new product with zero stock.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let sku = normalize_sku(&input.sku);
        if sku.is_empty() {
            return Err(DomainError::validation("sku", "sku cannot be empty"));
        }

        Ok(Self {
            id,
            name: required("name", &input.name)?,
            sku,
            category: required("category", &input.category)?,
            unit: input.unit,
            price: non_negative_price(input.price)?,
            current_stock: 0,
            supplier_id: input.supplier_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn current_stock(&self) -> u64 {
        self.current_stock
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_low_stock(&self, threshold: u64) -> bool {
        self.current_stock < threshold
    }

    /// Value of stock on hand (`price × currentStock`).
    pub fn stock_value(&self) -> Money {
        self.price
            .checked_mul(self.current_stock)
            .unwrap_or(Money::from_cents(i64::MAX))
    }

    /// Case-insensitive match on name or SKU.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.sku.to_lowercase().contains(&needle)
    }

    /// Apply a partial update. All fields are validated before any is written.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch.name.as_deref().map(|n| required("name", n)).transpose()?;
        let category = patch
            .category
            .as_deref()
            .map(|c| required("category", c))
            .transpose()?;
        let price = patch.price.map(non_negative_price).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_id = Some(supplier_id);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Take `quantity` out of stock, or fail without changing anything.
    pub fn deduct_stock(&mut self, quantity: u64, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity > self.current_stock {
            return Err(DomainError::insufficient_stock(
                self.name.clone(),
                self.current_stock,
                quantity,
            ));
        }
        self.current_stock -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Put `quantity` back into stock.
    pub fn restore_stock(&mut self, quantity: u64, now: DateTime<Utc>) {
        self.current_stock = self.current_stock.saturating_add(quantity);
        self.updated_at = now;
    }

    /// Overwrite stock (direct edit or batch recalculation).
    pub fn set_stock(&mut self, stock: u64, now: DateTime<Utc>) {
        self.current_stock = stock;
        self.updated_at = now;
    }
}
