//! Request payloads for the order workflow.

use serde::{Deserialize, Serialize};

use wholesale_core::{BatchId, CustomerId, DomainError, DomainResult, Money, ProductId};

use crate::status::OrderStatus;

/// One requested line. Price is taken from the catalog, never from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    /// Signed so that `0` and negatives are reported as validation failures.
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub items: Option<Vec<OrderItemRequest>>,
    pub discount: Option<Money>,
    pub tax: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Shape checks that need no store access; returns the quantities as `u64`.
pub fn validate_items(items: &[OrderItemRequest]) -> DomainResult<Vec<u64>> {
    if items.is_empty() {
        return Err(DomainError::validation("items", "order must contain at least one item"));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match u64::try_from(item.quantity) {
            Ok(q) if q >= 1 => Ok(q),
            _ => Err(DomainError::validation(
                format!("items[{i}].quantity"),
                "quantity must be at least 1",
            )),
        })
        .collect()
}

fn non_negative(field: &'static str, amount: Money) -> DomainResult<()> {
    if amount.is_negative() {
        return Err(DomainError::validation(field, format!("{field} cannot be negative")));
    }
    Ok(())
}

impl CreateOrderRequest {
    pub fn validate(&self) -> DomainResult<Vec<u64>> {
        let quantities = validate_items(&self.items)?;
        non_negative("discount", self.discount)?;
        non_negative("tax", self.tax)?;
        Ok(quantities)
    }
}

impl UpdateOrderRequest {
    pub fn validate(&self) -> DomainResult<Option<Vec<u64>>> {
        let quantities = self.items.as_deref().map(validate_items).transpose()?;
        if let Some(discount) = self.discount {
            non_negative("discount", discount)?;
        }
        if let Some(tax) = self.tax {
            non_negative("tax", tax)?;
        }
        Ok(quantities)
    }
}
