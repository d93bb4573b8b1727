//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**: two value objects with the same
//! attributes are the same value. `Money` and `OrderNumber` are the main ones
//! in this workspace.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// let a = Money::from_cents(1_250);
/// let b = Money::from_major(12.5);
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
