use core::str::FromStr;

use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult};

/// Order lifecycle.
///
/// ```text
/// Pending ──► Confirmed ──► Delivered
///    │            │
///    └──────┬─────┘
///           ▼
///       Cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses reachable in one step.
    pub fn next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_empty()
    }

    /// Check a transition and return the target status.
    pub fn transition(self, to: OrderStatus) -> DomainResult<OrderStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(DomainError::invalid_transition(self, to))
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation("status", format!("unknown order status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(OrderStatus::Pending.transition(OrderStatus::Confirmed), Ok(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::Pending.transition(OrderStatus::Cancelled), Ok(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::Confirmed.transition(OrderStatus::Delivered), Ok(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Confirmed.transition(OrderStatus::Cancelled), Ok(OrderStatus::Cancelled));
    }

    #[test]
    fn delivered_cannot_go_back() {
        assert_eq!(
            OrderStatus::Delivered.transition(OrderStatus::Confirmed),
            Err(DomainError::invalid_transition("Delivered", "Confirmed"))
        );
    }

    #[test]
    fn cancelled_is_terminal() {
        for to in OrderStatus::ALL {
            assert!(OrderStatus::Cancelled.transition(to).is_err());
        }
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn pending_cannot_skip_to_delivered_or_stay() {
        assert!(OrderStatus::Pending.transition(OrderStatus::Delivered).is_err());
        assert!(OrderStatus::Pending.transition(OrderStatus::Pending).is_err());
    }

    #[test]
    fn parse_and_wire_format() {
        assert_eq!("confirmed".parse::<OrderStatus>().unwrap(), OrderStatus::Confirmed);
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_value(OrderStatus::Pending).unwrap(), serde_json::json!("Pending"));
    }
}
