use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "orders.create"). The wildcard `"*"`
/// grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ALL: Permission = Permission::named("*");

    pub const PRODUCTS_READ: Permission = Permission::named("products.read");
    pub const PRODUCTS_WRITE: Permission = Permission::named("products.write");
    pub const PRODUCTS_DELETE: Permission = Permission::named("products.delete");

    pub const BATCHES_READ: Permission = Permission::named("batches.read");
    pub const BATCHES_WRITE: Permission = Permission::named("batches.write");
    pub const BATCHES_DELETE: Permission = Permission::named("batches.delete");

    pub const PARTIES_READ: Permission = Permission::named("parties.read");
    pub const PARTIES_WRITE: Permission = Permission::named("parties.write");
    /// Create customers only; suppliers still need `parties.write`.
    pub const CUSTOMERS_CREATE: Permission = Permission::named("customers.create");
    pub const PARTIES_DELETE: Permission = Permission::named("parties.delete");

    pub const ORDERS_READ: Permission = Permission::named("orders.read");
    pub const ORDERS_CREATE: Permission = Permission::named("orders.create");
    pub const ORDERS_UPDATE: Permission = Permission::named("orders.update");
    pub const ORDERS_DELETE: Permission = Permission::named("orders.delete");

    pub const REPORTS_READ: Permission = Permission::named("reports.read");
    pub const REPORTS_SALES: Permission = Permission::named("reports.sales");

    pub const USERS_MANAGE: Permission = Permission::named("users.manage");

    pub const fn named(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
