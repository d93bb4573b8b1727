//! Parties domain module: customers and suppliers.
//!
//! Deterministic domain logic only (no IO, no HTTP, no storage). Uniqueness
//! of email/phone is enforced by the store's unique keys, not here.

pub mod contact;
pub mod customer;
pub mod supplier;

pub use contact::{ContactInfo, ContactPatch, is_valid_email, is_valid_phone};
pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use supplier::{NewSupplier, Supplier, SupplierPatch};
