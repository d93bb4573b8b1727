//! Infrastructure layer: document stores, services over them, user accounts,
//! reports and notification publishing.

pub mod catalog;
pub mod error;
pub mod notifications;
pub mod orders;
pub mod parties;
pub mod policy;
pub mod query;
pub mod reports;
pub mod stock;
pub mod store;
pub mod users;

pub use catalog::{BatchQuery, BatchView, CatalogService, ProductQuery, ProductSort, ProductView};
pub use error::{ServiceError, ServiceResult};
pub use notifications::{Notifier, SharedBus};
pub use orders::{Invoice, OrderQuery, OrderWorkflow};
pub use parties::{PartyDirectory, PartyQuery};
pub use policy::StockPolicy;
pub use query::{Page, PageRequest};
pub use reports::ReportService;
pub use store::{AnyStore, DocumentStore, InMemoryStore, StoreError, Transaction};
pub use users::{UserDirectory, UserQuery};
