//! Customer and supplier directory.

use std::sync::Arc;

use chrono::Utc;

use wholesale_core::{CustomerId, DomainError, Entity, SupplierId};
use wholesale_parties::{ContactInfo, Customer, CustomerPatch, NewCustomer, NewSupplier, Supplier, SupplierPatch};
use wholesale_products::Product;
use wholesale_sales::Order;

use crate::error::ServiceResult;
use crate::query::{Page, PageRequest, paginate};
use crate::store::{Document, DocumentStore, Transaction, require};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyQuery {
    /// Case-insensitive match on name, email or phone.
    pub search: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug)]
pub struct PartyDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for PartyDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> PartyDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn insert<D: Document>(&self, doc: &D) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.insert(doc).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch<D: Document>(&self, id: D::Id) -> ServiceResult<D> {
        let mut tx = self.store.begin().await?;
        let doc = require::<D, _>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn search<D: Document>(
        &self,
        query: PartyQuery,
        contact: impl Fn(&D) -> &ContactInfo,
    ) -> ServiceResult<Page<D>> {
        query.page.validate()?;
        let mut tx = self.store.begin().await?;
        let docs = tx.list::<D>().await?;
        tx.commit().await?;

        let needle = query.search.as_deref().unwrap_or("");
        let mut docs: Vec<D> = docs.into_iter().filter(|d| contact(d).matches(needle)).collect();
        docs.sort_by_key(|d| contact(d).name().to_lowercase());
        Ok(paginate(docs, query.page)?)
    }

    #[tracing::instrument(skip_all)]
    pub async fn create_customer(&self, input: NewCustomer) -> ServiceResult<Customer> {
        let customer = Customer::create(CustomerId::new(), input, Utc::now())?;
        self.insert(&customer).await?;
        tracing::info!(customer_id = %customer.id(), "customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.fetch(id).await
    }

    pub async fn list_customers(&self, query: PartyQuery) -> ServiceResult<Page<Customer>> {
        self.search(query, Customer::contact).await
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_customer(&self, id: CustomerId, patch: CustomerPatch) -> ServiceResult<Customer> {
        let mut tx = self.store.begin().await?;
        let mut customer = require::<Customer, _>(&mut tx, id).await?;
        customer.apply_patch(patch, Utc::now())?;
        tx.update(&customer).await?;
        tx.commit().await?;
        Ok(customer)
    }

    /// Refused while orders reference the customer.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let customer = require::<Customer, _>(&mut tx, id).await?;
        let orders = tx.find_by::<Order>("customerId", &id.to_string()).await?;
        if !orders.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "customer {} has {} order(s)",
                customer.name(),
                orders.len()
            ))
            .into());
        }
        tx.delete::<Customer>(id).await?;
        tx.commit().await?;
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub async fn create_supplier(&self, input: NewSupplier) -> ServiceResult<Supplier> {
        let supplier = Supplier::create(SupplierId::new(), input, Utc::now())?;
        self.insert(&supplier).await?;
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> ServiceResult<Supplier> {
        self.fetch(id).await
    }

    pub async fn list_suppliers(&self, query: PartyQuery) -> ServiceResult<Page<Supplier>> {
        self.search(query, Supplier::contact).await
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_supplier(&self, id: SupplierId, patch: SupplierPatch) -> ServiceResult<Supplier> {
        let mut tx = self.store.begin().await?;
        let mut supplier = require::<Supplier, _>(&mut tx, id).await?;
        supplier.apply_patch(patch, Utc::now())?;
        tx.update(&supplier).await?;
        tx.commit().await?;
        Ok(supplier)
    }

    /// Refused while products reference the supplier.
    #[tracing::instrument(skip(self))]
    pub async fn delete_supplier(&self, id: SupplierId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let supplier = require::<Supplier, _>(&mut tx, id).await?;
        let products = tx.find_by::<Product>("supplierId", &id.to_string()).await?;
        if !products.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "supplier {} still supplies {} product(s)",
                supplier.name(),
                products.len()
            ))
            .into());
        }
        tx.delete::<Supplier>(id).await?;
        tx.commit().await?;
        Ok(())
    }
}
