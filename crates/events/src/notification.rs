//! Notifications pushed to connected clients.
//!
//! Each variant serializes as a flat JSON object tagged with its wire name:
//!
//! ```json
//! {"type":"lowStockAlert","productId":"…","productName":"Rice","currentStock":4,"threshold":10,"timestamp":"…"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_auth::Role;
use wholesale_core::{BatchId, CustomerId, Money, OrderId, ProductId};

use crate::event::Event;

const ADMIN: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Manager];
const EVERYONE: &[Role] = &[Role::Admin, Role::Manager, Role::Clerk];

/// Which roles receive a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Audience(&'static [Role]);

impl Audience {
    pub fn admits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_id: OrderId,
    pub order_no: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total_amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub order_no: String,
    pub status: String,
    pub previous_status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: u64,
    pub threshold: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearExpiryAlert {
    pub batch_id: BatchId,
    pub batch_no: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub expiry_date: DateTime<Utc>,
    pub days_until_expiry: i64,
    /// `critical`, `urgent` or `warning`.
    pub urgency: String,
    pub timestamp: DateTime<Utc>,
}

/// What changed a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockAction {
    BatchCreated,
    BatchUpdated,
    BatchDeleted,
    StockSet,
    Recalculated,
    OrderPlaced,
    OrderUpdated,
    OrderDeleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    pub product_id: ProductId,
    pub product_name: String,
    pub action: StockAction,
    /// Signed change applied to the stock (negative for deductions).
    pub quantity: i64,
    pub current_stock: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    NewOrder(NewOrder),
    OrderStatusChanged(OrderStatusChanged),
    LowStockAlert(LowStockAlert),
    NearExpiryAlert(NearExpiryAlert),
    InventoryUpdate(InventoryUpdate),
}

impl Notification {
    pub fn audience(&self) -> Audience {
        match self {
            Self::NewOrder(_) | Self::NearExpiryAlert(_) | Self::InventoryUpdate(_) => {
                Audience(STAFF)
            }
            Self::LowStockAlert(_) => Audience(ADMIN),
            Self::OrderStatusChanged(_) => Audience(EVERYONE),
        }
    }
}

impl Event for Notification {
    fn event_type(&self) -> &'static str {
        match self {
            Self::NewOrder(_) => "newOrder",
            Self::OrderStatusChanged(_) => "orderStatusChanged",
            Self::LowStockAlert(_) => "lowStockAlert",
            Self::NearExpiryAlert(_) => "nearExpiryAlert",
            Self::InventoryUpdate(_) => "inventoryUpdate",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::NewOrder(e) => e.timestamp,
            Self::OrderStatusChanged(e) => e.timestamp,
            Self::LowStockAlert(e) => e.timestamp,
            Self::NearExpiryAlert(e) => e.timestamp,
            Self::InventoryUpdate(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_stock() -> Notification {
        Notification::LowStockAlert(LowStockAlert {
            product_id: ProductId::new(),
            product_name: "Basmati Rice".into(),
            current_stock: 4,
            threshold: 10,
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn serializes_flat_with_type_tag() {
        let json = serde_json::to_value(low_stock()).unwrap();
        assert_eq!(json["type"], "lowStockAlert");
        assert_eq!(json["productName"], "Basmati Rice");
        assert_eq!(json["currentStock"], 4);
    }

    #[test]
    fn event_type_matches_wire_tag() {
        let n = low_stock();
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], n.event_type());
    }

    #[test]
    fn audiences_follow_role_routing() {
        let low = low_stock();
        assert!(low.audience().admits(Role::Admin));
        assert!(!low.audience().admits(Role::Manager));

        let status = Notification::OrderStatusChanged(OrderStatusChanged {
            order_id: OrderId::new(),
            order_no: "ORD-20240101-0001".into(),
            status: "Confirmed".into(),
            previous_status: "Pending".into(),
            timestamp: Utc::now(),
        });
        assert!(status.audience().admits(Role::Clerk));

        let update = Notification::InventoryUpdate(InventoryUpdate {
            product_id: ProductId::new(),
            product_name: "Flour".into(),
            action: StockAction::BatchCreated,
            quantity: 5,
            current_stock: 5,
            timestamp: Utc::now(),
        });
        assert!(update.audience().admits(Role::Manager));
        assert!(!update.audience().admits(Role::Clerk));
    }
}
