//! Collection bindings for the domain records.

use wholesale_auth::User;
use wholesale_inventory::Batch;
use wholesale_parties::{Customer, Supplier};
use wholesale_products::Product;
use wholesale_sales::Order;

use super::Document;

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("sku", self.sku().to_string())]
    }
}

impl Document for Batch {
    const COLLECTION: &'static str = "batches";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("batchNo", self.batch_no().to_string())]
    }
}

impl Document for Customer {
    const COLLECTION: &'static str = "customers";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let contact = self.contact();
        vec![("email", contact.email().to_string()), ("phone", contact.phone().to_string())]
    }
}

impl Document for Supplier {
    const COLLECTION: &'static str = "suppliers";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let contact = self.contact();
        vec![("email", contact.email().to_string()), ("phone", contact.phone().to_string())]
    }
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("orderNo", self.order_no().to_string())]
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email().to_string())]
    }
}
