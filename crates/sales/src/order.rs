use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{
    BatchId, CustomerId, DomainError, DomainResult, Entity, Money, OrderId, ProductId, UserId,
};

use crate::number::OrderNumber;
use crate::status::OrderStatus;
use crate::totals::OrderTotals;

/// One order line. `price` is the product price captured when the line was
/// priced; later catalog changes do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    pub quantity: u64,
    pub price: Money,
}

impl OrderLine {
    pub fn new(product_id: ProductId, batch_id: Option<BatchId>, quantity: u64, price: Money) -> Self {
        Self {
            product_id,
            batch_id,
            quantity,
            price,
        }
    }

    /// `quantity × price`, or `None` on overflow.
    pub fn amount(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// Changes to a pending order. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRevision {
    pub items: Option<Vec<OrderLine>>,
    pub discount: Option<Money>,
    pub tax: Option<Money>,
    pub notes: Option<String>,
}

/// A customer order.
///
/// `subtotal`/`netAmount` are derived from the lines, discount and tax and are
/// recomputed by every mutating method before it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    order_no: OrderNumber,
    customer_id: CustomerId,
    items: Vec<OrderLine>,
    subtotal: Money,
    discount: Money,
    tax: Money,
    net_amount: Money,
    status: OrderStatus,
    #[serde(default)]
    notes: Option<String>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

fn ensure_lines(items: &[OrderLine]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("items", "order must contain at least one item"));
    }
    if let Some(i) = items.iter().position(|l| l.quantity == 0) {
        return Err(DomainError::validation(
            format!("items[{i}].quantity"),
            "quantity must be at least 1",
        ));
    }
    if let Some(i) = items.iter().position(|l| l.price.is_negative()) {
        return Err(DomainError::validation(format!("items[{i}].price"), "price cannot be negative"));
    }
    Ok(())
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl Order {
    /// Build a new `Pending` order. Stock has already been reserved by the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        id: OrderId,
        order_no: OrderNumber,
        customer_id: CustomerId,
        items: Vec<OrderLine>,
        discount: Money,
        tax: Money,
        notes: Option<String>,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_lines(&items)?;
        let totals = OrderTotals::compute(&items, discount, tax)?;

        Ok(Self {
            id,
            order_no,
            customer_id,
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            tax: totals.tax,
            net_amount: totals.net_amount,
            status: OrderStatus::Pending,
            notes: clean_notes(notes),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn order_no(&self) -> &OrderNumber {
        &self.order_no
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn net_amount(&self) -> Money {
        self.net_amount
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            discount: self.discount,
            tax: self.tax,
            net_amount: self.net_amount,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Units across all lines.
    pub fn units(&self) -> u64 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "order {} is {} and can no longer be edited",
                self.order_no, self.status
            )));
        }
        Ok(())
    }

    /// Apply a revision to a pending order and recompute totals. Nothing is
    /// written if any part is invalid.
    pub fn revise(&mut self, revision: OrderRevision, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;

        let items = revision.items.unwrap_or_else(|| self.items.clone());
        ensure_lines(&items)?;
        let totals = OrderTotals::compute(
            &items,
            revision.discount.unwrap_or(self.discount),
            revision.tax.unwrap_or(self.tax),
        )?;

        self.items = items;
        self.subtotal = totals.subtotal;
        self.discount = totals.discount;
        self.tax = totals.tax;
        self.net_amount = totals.net_amount;
        if revision.notes.is_some() {
            self.notes = clean_notes(revision.notes);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move along the status graph; returns the previous status.
    pub fn change_status(&mut self, to: OrderStatus, now: DateTime<Utc>) -> DomainResult<OrderStatus> {
        let previous = self.status;
        self.status = previous.transition(to)?;
        self.updated_at = now;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn number() -> OrderNumber {
        OrderNumber::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 1).unwrap()
    }

    fn line(qty: u64, cents: i64) -> OrderLine {
        OrderLine::new(ProductId::new(), None, qty, Money::from_cents(cents))
    }

    fn order(items: Vec<OrderLine>) -> DomainResult<Order> {
        Order::place(
            OrderId::new(),
            number(),
            CustomerId::new(),
            items,
            Money::ZERO,
            Money::ZERO,
            Some("  deliver before noon ".into()),
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn place_starts_pending_with_totals() {
        let o = order(vec![line(4, 2500)]).unwrap();
        assert_eq!(o.status(), OrderStatus::Pending);
        assert_eq!(o.subtotal(), Money::from_cents(10_000));
        assert_eq!(o.net_amount(), Money::from_cents(10_000));
        assert_eq!(o.notes(), Some("deliver before noon"));
        assert_eq!(o.units(), 4);
    }

    #[test]
    fn place_rejects_empty_and_zero_quantity() {
        assert!(matches!(order(vec![]), Err(DomainError::Validation { field, .. }) if field == "items"));
        assert!(matches!(
            order(vec![line(1, 100), line(0, 100)]),
            Err(DomainError::Validation { field, .. }) if field == "items[1].quantity"
        ));
    }

    #[test]
    fn revise_recomputes_totals() {
        let mut o = order(vec![line(4, 2500)]).unwrap();
        o.revise(
            OrderRevision {
                items: Some(vec![line(7, 2500)]),
                discount: Some(Money::from_cents(500)),
                ..OrderRevision::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(o.subtotal(), Money::from_cents(17_500));
        assert_eq!(o.net_amount(), Money::from_cents(17_000));
    }

    #[test]
    fn revise_is_atomic_on_failure() {
        let mut o = order(vec![line(1, 1000)]).unwrap();
        let before = o.clone();
        let err = o.revise(
            OrderRevision {
                items: Some(vec![line(1, 100)]),
                discount: Some(Money::from_cents(5000)),
                ..OrderRevision::default()
            },
            Utc::now(),
        );
        assert!(err.is_err());
        assert_eq!(o, before);
    }

    #[test]
    fn only_pending_orders_are_editable() {
        let mut o = order(vec![line(1, 1000)]).unwrap();
        o.change_status(OrderStatus::Confirmed, Utc::now()).unwrap();
        let err = o.revise(OrderRevision::default(), Utc::now()).unwrap_err();
        assert_eq!(err.code(), "invalid_state");
    }

    #[test]
    fn change_status_returns_previous() {
        let mut o = order(vec![line(1, 1000)]).unwrap();
        assert_eq!(o.change_status(OrderStatus::Cancelled, Utc::now()).unwrap(), OrderStatus::Pending);
        assert!(o.change_status(OrderStatus::Confirmed, Utc::now()).is_err());
        assert_eq!(o.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn wire_shape() {
        let o = order(vec![line(2, 199)]).unwrap();
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["orderNo"], "ORD-20240315-0001");
        assert_eq!(json["netAmount"], serde_json::json!(3.98));
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["items"][0]["quantity"], 2);

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, o);
    }
}
