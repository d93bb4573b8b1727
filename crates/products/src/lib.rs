//! Products domain module.
//!
//! Business rules for the product catalog, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{DEFAULT_LOW_STOCK_THRESHOLD, NewProduct, Product, ProductPatch, Unit, normalize_sku};
