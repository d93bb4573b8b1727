//! Fire-and-forget publication of notifications.
//!
//! Services call into [`Notifier`] only after their transaction has
//! committed. A failed publish is logged and otherwise ignored.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use wholesale_core::Entity;
use wholesale_events::{
    BusError, Event, EventBus, InventoryUpdate, LowStockAlert, NearExpiryAlert, NewOrder,
    NoopEventBus, Notification, OrderStatusChanged, StockAction,
};
use wholesale_inventory::Batch;
use wholesale_products::Product;
use wholesale_sales::{Order, OrderStatus};

use crate::policy::StockPolicy;

pub type SharedBus = Arc<dyn EventBus<Notification, Error = BusError>>;

#[derive(Clone)]
pub struct Notifier {
    bus: SharedBus,
    policy: StockPolicy,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(bus: SharedBus, policy: StockPolicy) -> Self {
        Self { bus, policy }
    }

    /// Drops every notification.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopEventBus), StockPolicy::default())
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    pub fn publish(&self, notification: Notification) {
        let event_type = notification.event_type();
        if let Err(error) = self.bus.publish(notification) {
            tracing::warn!(%error, event_type, "failed to publish notification");
        }
    }

    /// `inventoryUpdate`, followed by `lowStockAlert` when the product is now
    /// below the threshold.
    pub fn stock_changed(&self, product: &Product, action: StockAction, quantity: i64, now: DateTime<Utc>) {
        self.publish(Notification::InventoryUpdate(InventoryUpdate {
            product_id: product.id(),
            product_name: product.name().to_string(),
            action,
            quantity,
            current_stock: product.current_stock(),
            timestamp: now,
        }));

        if product.is_low_stock(self.policy.low_stock_threshold) {
            self.publish(Notification::LowStockAlert(LowStockAlert {
                product_id: product.id(),
                product_name: product.name().to_string(),
                current_stock: product.current_stock(),
                threshold: self.policy.low_stock_threshold,
                timestamp: now,
            }));
        }
    }

    /// `nearExpiryAlert` when the batch expires inside the window.
    pub fn batch_expiry(&self, batch: &Batch, product_name: &str, now: DateTime<Utc>) {
        if !batch.is_near_expiry(now, self.policy.near_expiry_days) {
            return;
        }
        self.publish(Notification::NearExpiryAlert(NearExpiryAlert {
            batch_id: batch.id(),
            batch_no: batch.batch_no().to_string(),
            product_id: batch.product_id(),
            product_name: product_name.to_string(),
            expiry_date: batch.expiry_date(),
            days_until_expiry: batch.days_until_expiry(now),
            urgency: batch.urgency(now).as_str().to_string(),
            timestamp: now,
        }));
    }

    pub fn order_placed(&self, order: &Order, customer_name: &str, now: DateTime<Utc>) {
        self.publish(Notification::NewOrder(NewOrder {
            order_id: order.id(),
            order_no: order.order_no().to_string(),
            customer_id: order.customer_id(),
            customer_name: customer_name.to_string(),
            total_amount: order.net_amount(),
            timestamp: now,
        }));
    }

    pub fn status_changed(&self, order: &Order, previous: OrderStatus, now: DateTime<Utc>) {
        self.publish(Notification::OrderStatusChanged(OrderStatusChanged {
            order_id: order.id(),
            order_no: order.order_no().to_string(),
            status: order.status().to_string(),
            previous_status: previous.to_string(),
            timestamp: now,
        }));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use wholesale_core::{BatchId, Money, ProductId};
    use wholesale_events::InMemoryEventBus;
    use wholesale_inventory::NewBatch;
    use wholesale_products::{NewProduct, Unit};

    use super::*;

    fn product(stock: u64) -> Product {
        let mut p = Product::create(
            ProductId::new(),
            NewProduct {
                name: "Rice".into(),
                sku: "rice-5".into(),
                category: "Grains".into(),
                unit: Unit::Kg,
                price: Money::from_cents(500),
                supplier_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        p.set_stock(stock, Utc::now());
        p
    }

    fn notifier() -> (Notifier, Arc<InMemoryEventBus<Notification>>) {
        let bus = Arc::new(InMemoryEventBus::<Notification>::new());
        (Notifier::new(bus.clone(), StockPolicy::default()), bus)
    }

    #[tokio::test]
    async fn low_stock_follows_inventory_update() {
        let (notifier, bus) = notifier();
        let mut sub = bus.subscribe();

        notifier.stock_changed(&product(4), StockAction::OrderPlaced, -6, Utc::now());

        assert_eq!(sub.recv().await.map(|n| n.event_type()), Some("inventoryUpdate"));
        assert_eq!(sub.recv().await.map(|n| n.event_type()), Some("lowStockAlert"));
    }

    #[tokio::test]
    async fn healthy_stock_sends_only_the_update() {
        let (notifier, bus) = notifier();
        let mut sub = bus.subscribe();

        notifier.stock_changed(&product(10), StockAction::StockSet, 10, Utc::now());

        assert_eq!(sub.recv().await.map(|n| n.event_type()), Some("inventoryUpdate"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn near_expiry_only_inside_window() {
        let (notifier, bus) = notifier();
        let mut sub = bus.subscribe();
        let now = Utc::now();
        let batch = |days| {
            Batch::create(
                BatchId::new(),
                NewBatch {
                    product_id: ProductId::new(),
                    batch_no: "B1".into(),
                    quantity: 5,
                    manufactured_date: now - Duration::days(10),
                    expiry_date: now + Duration::days(days),
                },
                now,
            )
            .unwrap()
        };

        notifier.batch_expiry(&batch(90), "Rice", now);
        assert!(sub.try_recv().is_none());

        notifier.batch_expiry(&batch(5), "Rice", now);
        match sub.recv().await {
            Some(Notification::NearExpiryAlert(alert)) => {
                assert_eq!(alert.urgency, "critical");
                assert_eq!(alert.days_until_expiry, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn publish_failures_are_swallowed() {
        let bus = Arc::new(InMemoryEventBus::<Notification>::new());
        bus.close();
        let notifier = Notifier::new(bus, StockPolicy::default());
        notifier.stock_changed(&product(1), StockAction::StockSet, 1, Utc::now());
    }
}
