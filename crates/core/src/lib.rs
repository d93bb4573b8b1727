//! `wholesale-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the shared error taxonomy and the `Money` value object.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, CustomerId, OrderId, ProductId, SupplierId, UserId};
pub use money::{Money, round2};
pub use value_object::ValueObject;
