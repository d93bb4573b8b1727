//! Products and batches.
//!
//! Batch mutations commit first and then recalculate the owning product's
//! stock in a separate transaction; a failed recalculation is logged and the
//! batch change stands.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{BatchId, DomainError, Entity, ProductId, SupplierId};
use wholesale_events::StockAction;
use wholesale_inventory::{Batch, BatchPatch, NewBatch};
use wholesale_parties::Supplier;
use wholesale_products::{NewProduct, Product, ProductPatch};

use crate::error::ServiceResult;
use crate::notifications::Notifier;
use crate::query::{Page, PageRequest, paginate};
use crate::stock;
use crate::store::{DocumentStore, Transaction, require};

/// Product with derived fields for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub is_low_stock: bool,
    pub batch_count: usize,
}

/// Batch with expiry status relative to the time of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub is_expired: bool,
    pub is_near_expiry: bool,
    pub days_until_expiry: i64,
}

impl BatchView {
    pub fn new(batch: Batch, now: DateTime<Utc>, near_expiry_days: i64) -> Self {
        Self {
            is_expired: batch.is_expired(now),
            is_near_expiry: batch.is_near_expiry(now, near_expiry_days),
            days_until_expiry: batch.days_until_expiry(now),
            batch,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    /// Newest first.
    #[default]
    CreatedAt,
    Name,
    Price,
    Stock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: ProductSort,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchQuery {
    pub include_expired: bool,
    /// Only batches expiring within this many days.
    pub near_expiry_days: Option<i64>,
}

fn signed(quantity: u64) -> i64 {
    i64::try_from(quantity).unwrap_or(i64::MAX)
}

fn stock_delta(before: u64, after: u64) -> i64 {
    signed(after).saturating_sub(signed(before))
}

#[derive(Debug)]
pub struct CatalogService<S> {
    store: Arc<S>,
    notifier: Notifier,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S: DocumentStore> CatalogService<S> {
    pub fn new(store: Arc<S>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    fn near_expiry_days(&self) -> i64 {
        self.notifier.policy().near_expiry_days
    }

    async fn ensure_supplier<T: Transaction>(tx: &mut T, supplier_id: Option<SupplierId>) -> ServiceResult<()> {
        if let Some(id) = supplier_id {
            require::<Supplier, _>(tx, id).await?;
        }
        Ok(())
    }

    fn view(&self, product: Product, batch_count: usize) -> ProductView {
        ProductView {
            is_low_stock: product.is_low_stock(self.notifier.policy().low_stock_threshold),
            batch_count,
            product,
        }
    }

    #[tracing::instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        let product = Product::create(ProductId::new(), input, Utc::now())?;

        let mut tx = self.store.begin().await?;
        Self::ensure_supplier(&mut tx, product.supplier_id()).await?;
        tx.insert(&product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id(), sku = product.sku(), "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<ProductView> {
        let mut tx = self.store.begin().await?;
        let product = require::<Product, _>(&mut tx, id).await?;
        let batches = tx.find_by::<Batch>("productId", &id.to_string()).await?;
        tx.commit().await?;
        Ok(self.view(product, batches.len()))
    }

    pub async fn list_products(&self, query: ProductQuery) -> ServiceResult<Page<ProductView>> {
        query.page.validate()?;

        let mut tx = self.store.begin().await?;
        let products = tx.list::<Product>().await?;
        let batches = tx.list::<Batch>().await?;
        tx.commit().await?;

        let mut batch_counts: HashMap<ProductId, usize> = HashMap::new();
        for batch in &batches {
            *batch_counts.entry(batch.product_id()).or_default() += 1;
        }

        let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let search = query.search.as_deref().unwrap_or("");
        let mut products: Vec<Product> = products
            .into_iter()
            .filter(|p| category.is_none_or(|c| p.category().eq_ignore_ascii_case(c)))
            .filter(|p| p.matches(search))
            .collect();

        match query.sort_by {
            ProductSort::CreatedAt => products.sort_by(|a, b| (b.created_at(), b.id()).cmp(&(a.created_at(), a.id()))),
            ProductSort::Name => products.sort_by_key(|p| p.name().to_lowercase()),
            ProductSort::Price => products.sort_by_key(|p| p.price()),
            ProductSort::Stock => products.sort_by_key(|p| p.current_stock()),
        }

        let page = paginate(products, query.page)?;
        Ok(page.map(|p| {
            let count = batch_counts.get(&p.id()).copied().unwrap_or(0);
            self.view(p, count)
        }))
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ServiceResult<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = require::<Product, _>(&mut tx, id).await?;
        Self::ensure_supplier(&mut tx, patch.supplier_id).await?;
        product.apply_patch(patch, Utc::now())?;
        tx.update(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Overwrite stock directly. Signed input so negatives are rejected as
    /// validation failures.
    #[tracing::instrument(skip(self))]
    pub async fn set_stock(&self, id: ProductId, stock: i64) -> ServiceResult<Product> {
        let stock = u64::try_from(stock)
            .map_err(|_| DomainError::validation("currentStock", "stock cannot be negative"))?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut product = require::<Product, _>(&mut tx, id).await?;
        let before = product.current_stock();
        product.set_stock(stock, now);
        tx.update(&product).await?;
        tx.commit().await?;

        self.notifier
            .stock_changed(&product, StockAction::StockSet, stock_delta(before, stock), now);
        Ok(product)
    }

    /// Refused while the product still has batches.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let product = require::<Product, _>(&mut tx, id).await?;
        let batches = tx.find_by::<Batch>("productId", &id.to_string()).await?;
        if !batches.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "product {} still has {} batch(es)",
                product.sku(),
                batches.len()
            ))
            .into());
        }
        tx.delete::<Product>(id).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Strict recalculation; errors propagate.
    #[tracing::instrument(skip(self))]
    pub async fn recalculate_stock(&self, id: ProductId) -> ServiceResult<Product> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let outcome = stock::recalculate_in(&mut tx, id, now).await?;
        tx.commit().await?;

        self.notifier
            .stock_changed(&outcome.product, StockAction::Recalculated, outcome.delta(), now);
        Ok(outcome.product)
    }

    #[tracing::instrument(skip(self, input), fields(product_id = %input.product_id, batch_no = %input.batch_no))]
    pub async fn create_batch(&self, input: NewBatch) -> ServiceResult<BatchView> {
        let now = Utc::now();
        let batch = Batch::create(BatchId::new(), input, now)?;

        let mut tx = self.store.begin().await?;
        let product = require::<Product, _>(&mut tx, batch.product_id()).await?;
        tx.insert(&batch).await?;
        tx.commit().await?;

        tracing::info!(batch_id = %batch.id(), quantity = batch.quantity(), "batch received");
        if let Some(outcome) = stock::recalculate_best_effort(&*self.store, batch.product_id(), now).await {
            self.notifier
                .stock_changed(&outcome.product, StockAction::BatchCreated, outcome.delta(), now);
        }
        self.notifier.batch_expiry(&batch, product.name(), now);

        Ok(BatchView::new(batch, now, self.near_expiry_days()))
    }

    pub async fn get_batch(&self, id: BatchId) -> ServiceResult<BatchView> {
        let mut tx = self.store.begin().await?;
        let batch = require::<Batch, _>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(BatchView::new(batch, Utc::now(), self.near_expiry_days()))
    }

    /// Batches of a product, soonest expiry first.
    pub async fn list_batches(&self, product_id: ProductId, query: BatchQuery) -> ServiceResult<Vec<BatchView>> {
        if query.near_expiry_days.is_some_and(|d| d < 0) {
            return Err(DomainError::validation("nearExpiry", "days cannot be negative").into());
        }
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        require::<Product, _>(&mut tx, product_id).await?;
        let mut batches = tx.find_by::<Batch>("productId", &product_id.to_string()).await?;
        tx.commit().await?;

        batches.retain(|b| query.include_expired || !b.is_expired(now));
        if let Some(days) = query.near_expiry_days {
            batches.retain(|b| b.is_near_expiry(now, days));
        }
        batches.sort_by_key(|b| b.expiry_date());

        let window = self.near_expiry_days();
        Ok(batches.into_iter().map(|b| BatchView::new(b, now, window)).collect())
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_batch(&self, id: BatchId, patch: BatchPatch) -> ServiceResult<BatchView> {
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut batch = require::<Batch, _>(&mut tx, id).await?;
        let quantity_changed = batch.apply_patch(patch, now)?;
        tx.update(&batch).await?;
        let product_name = tx
            .get::<Product>(batch.product_id())
            .await?
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        tx.commit().await?;

        if quantity_changed {
            if let Some(outcome) = stock::recalculate_best_effort(&*self.store, batch.product_id(), now).await {
                self.notifier
                    .stock_changed(&outcome.product, StockAction::BatchUpdated, outcome.delta(), now);
            }
        }
        self.notifier.batch_expiry(&batch, &product_name, now);

        Ok(BatchView::new(batch, now, self.near_expiry_days()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_batch(&self, id: BatchId) -> ServiceResult<()> {
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let batch = require::<Batch, _>(&mut tx, id).await?;
        tx.delete::<Batch>(id).await?;
        tx.commit().await?;

        tracing::info!(batch_id = %id, "batch deleted");
        if let Some(outcome) = stock::recalculate_best_effort(&*self.store, batch.product_id(), now).await {
            self.notifier
                .stock_changed(&outcome.product, StockAction::BatchDeleted, outcome.delta(), now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use wholesale_core::Money;
    use wholesale_products::Unit;

    use wholesale_events::{EventBus, InMemoryEventBus, Notification, Subscription};

    use super::*;
    use crate::policy::StockPolicy;
    use crate::store::InMemoryStore;

    fn service() -> CatalogService<InMemoryStore> {
        CatalogService::new(Arc::new(InMemoryStore::new()), Notifier::noop())
    }

    fn observed_service() -> (CatalogService<InMemoryStore>, Arc<InMemoryEventBus<Notification>>) {
        let bus = Arc::new(InMemoryEventBus::<Notification>::new());
        let notifier = Notifier::new(bus.clone(), StockPolicy::default());
        (CatalogService::new(Arc::new(InMemoryStore::new()), notifier), bus)
    }

    fn next_update(sub: &mut Subscription<Notification>) -> (StockAction, i64, u64) {
        loop {
            match sub.try_recv() {
                Some(Notification::InventoryUpdate(u)) => return (u.action, u.quantity, u.current_stock),
                Some(_) => continue,
                None => panic!("no inventoryUpdate published"),
            }
        }
    }

    fn new_product(sku: &str, name: &str, cents: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            sku: sku.into(),
            category: "Grains".into(),
            unit: Unit::Kg,
            price: Money::from_cents(cents),
            supplier_id: None,
        }
    }

    fn new_batch(product_id: ProductId, batch_no: &str, quantity: i64, expires_in_days: i64) -> NewBatch {
        let now = Utc::now();
        NewBatch {
            product_id,
            batch_no: batch_no.into(),
            quantity,
            manufactured_date: now - Duration::days(60),
            expiry_date: now + Duration::days(expires_in_days),
        }
    }

    #[tokio::test]
    async fn batches_drive_current_stock() {
        let svc = service();
        let p = svc.create_product(new_product("RICE-5", "Rice", 500)).await.unwrap();
        assert_eq!(p.current_stock(), 0);

        let b1 = svc.create_batch(new_batch(p.id(), "B1", 5, 90)).await.unwrap();
        svc.create_batch(new_batch(p.id(), "B2", 3, 120)).await.unwrap();
        assert_eq!(svc.get_product(p.id()).await.unwrap().product.current_stock(), 8);

        svc.delete_batch(b1.batch.id()).await.unwrap();
        let view = svc.get_product(p.id()).await.unwrap();
        assert_eq!(view.product.current_stock(), 3);
        assert_eq!(view.batch_count, 1);
        assert!(view.is_low_stock);
    }

    #[tokio::test]
    async fn batch_notifications_report_the_stock_change() {
        let (svc, bus) = observed_service();
        let mut sub = bus.subscribe();
        let p = svc.create_product(new_product("DAL-1", "Dal", 400)).await.unwrap();

        let b1 = svc.create_batch(new_batch(p.id(), "D1", 10, 90)).await.unwrap();
        assert_eq!(next_update(&mut sub), (StockAction::BatchCreated, 10, 10));

        // Stock drifts from the batch total, as it does after an order.
        svc.set_stock(p.id(), 6).await.unwrap();
        assert_eq!(next_update(&mut sub), (StockAction::StockSet, -4, 6));

        let b2 = svc.create_batch(new_batch(p.id(), "D2", 5, 90)).await.unwrap();
        assert_eq!(next_update(&mut sub), (StockAction::BatchCreated, 9, 15));

        svc.update_batch(
            b2.batch.id(),
            BatchPatch {
                quantity: Some(2),
                ..BatchPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(next_update(&mut sub), (StockAction::BatchUpdated, -3, 12));

        svc.set_stock(p.id(), 8).await.unwrap();
        next_update(&mut sub);
        svc.delete_batch(b1.batch.id()).await.unwrap();
        assert_eq!(next_update(&mut sub), (StockAction::BatchDeleted, -6, 2));
    }

    #[tokio::test]
    async fn batch_quantity_update_recalculates() {
        let svc = service();
        let p = svc.create_product(new_product("OIL-1", "Oil", 1200)).await.unwrap();
        let b = svc.create_batch(new_batch(p.id(), "OIL-B1", 20, 90)).await.unwrap();

        svc.update_batch(
            b.batch.id(),
            BatchPatch {
                quantity: Some(12),
                ..BatchPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.get_product(p.id()).await.unwrap().product.current_stock(), 12);
    }

    #[tokio::test]
    async fn recalculation_overwrites_direct_edits_and_is_idempotent() {
        let svc = service();
        let p = svc.create_product(new_product("SALT-1", "Salt", 100)).await.unwrap();
        svc.create_batch(new_batch(p.id(), "S1", 7, 90)).await.unwrap();

        svc.set_stock(p.id(), 50).await.unwrap();
        assert_eq!(svc.recalculate_stock(p.id()).await.unwrap().current_stock(), 7);
        assert_eq!(svc.recalculate_stock(p.id()).await.unwrap().current_stock(), 7);
    }

    #[tokio::test]
    async fn duplicate_sku_and_batch_number_are_rejected() {
        let svc = service();
        let p = svc.create_product(new_product("rice-5", "Rice", 500)).await.unwrap();
        let err = svc.create_product(new_product(" RICE-5 ", "Other", 1)).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("duplicate_key"));

        svc.create_batch(new_batch(p.id(), "b-1", 1, 90)).await.unwrap();
        let err = svc.create_batch(new_batch(p.id(), "B-1", 1, 90)).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("duplicate_key"));
    }

    #[tokio::test]
    async fn batch_for_unknown_product_is_not_found() {
        let svc = service();
        let err = svc.create_batch(new_batch(ProductId::new(), "X", 1, 90)).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("not_found"));
    }

    #[tokio::test]
    async fn product_with_batches_cannot_be_deleted() {
        let svc = service();
        let p = svc.create_product(new_product("SUGAR", "Sugar", 300)).await.unwrap();
        let b = svc.create_batch(new_batch(p.id(), "SG1", 2, 90)).await.unwrap();

        let err = svc.delete_product(p.id()).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("invalid_state"));

        svc.delete_batch(b.batch.id()).await.unwrap();
        svc.delete_product(p.id()).await.unwrap();
        assert!(svc.get_product(p.id()).await.is_err());
    }

    #[tokio::test]
    async fn negative_stock_is_a_validation_error() {
        let svc = service();
        let p = svc.create_product(new_product("TEA", "Tea", 900)).await.unwrap();
        let err = svc.set_stock(p.id(), -1).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("validation_failed"));
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let svc = service();
        svc.create_product(new_product("A-1", "Basmati", 900)).await.unwrap();
        svc.create_product(new_product("A-2", "Arborio", 500)).await.unwrap();
        let mut other = new_product("B-1", "Chickpeas", 700);
        other.category = "Pulses".into();
        svc.create_product(other).await.unwrap();

        let page = svc
            .list_products(ProductQuery {
                category: Some("grains".into()),
                sort_by: ProductSort::Price,
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|v| v.product.name()).collect();
        assert_eq!(names, vec!["Arborio", "Basmati"]);

        let page = svc
            .list_products(ProductQuery {
                search: Some("b-".into()),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = svc
            .list_products(ProductQuery {
                page: PageRequest::new(2, 2).unwrap(),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pages, 2);
        // Newest first: the oldest product lands on the last page.
        assert_eq!(page.items[0].product.name(), "Basmati");
    }

    #[tokio::test]
    async fn batch_listing_is_fefo_and_hides_expired() {
        let svc = service();
        let p = svc.create_product(new_product("MILK", "Milk", 150)).await.unwrap();
        svc.create_batch(new_batch(p.id(), "LATE", 1, 200)).await.unwrap();
        svc.create_batch(new_batch(p.id(), "SOON", 1, 10)).await.unwrap();
        svc.create_batch(new_batch(p.id(), "GONE", 1, -2)).await.unwrap();

        let live = svc.list_batches(p.id(), BatchQuery::default()).await.unwrap();
        let numbers: Vec<_> = live.iter().map(|v| v.batch.batch_no()).collect();
        assert_eq!(numbers, vec!["SOON", "LATE"]);
        assert!(live[0].is_near_expiry);

        let all = svc
            .list_batches(
                p.id(),
                BatchQuery {
                    include_expired: true,
                    ..BatchQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].is_expired);

        let near = svc
            .list_batches(
                p.id(),
                BatchQuery {
                    near_expiry_days: Some(30),
                    ..BatchQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(near.len(), 1);
    }
}
