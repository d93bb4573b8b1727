//! Order workflow.
//!
//! The only writer of orders, and the only order-path writer of
//! `Product.currentStock`. Every mutation runs in one store transaction:
//! stock reservation, order-number allocation and the order write commit or
//! roll back together. Notifications go out after commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use wholesale_core::{BatchId, CustomerId, DomainError, Entity, Money, OrderId, ProductId, UserId};
use wholesale_events::StockAction;
use wholesale_inventory::Batch;
use wholesale_parties::Customer;
use wholesale_products::Product;
use wholesale_sales::{
    CreateOrderRequest, Order, OrderItemRequest, OrderLine, OrderNumber, OrderRevision, OrderStatus,
    UpdateOrderRequest,
};

use crate::error::{ServiceError, ServiceResult};
use crate::notifications::Notifier;
use crate::query::{Page, PageRequest, paginate};
use crate::store::{DocumentStore, Transaction, require};

/// Attempts at allocating an order number before giving up.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive match on the order number or the customer's name.
    pub search: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCustomer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Product details are absent if the product has since been removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub batch_id: Option<BatchId>,
    pub batch_no: Option<String>,
    pub quantity: u64,
    pub price: Money,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub order_id: OrderId,
    pub order_no: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub customer: InvoiceCustomer,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub net_amount: Money,
    pub notes: Option<String>,
}

/// Products touched by one transaction, with their stock when first loaded.
#[derive(Default)]
struct StockDraft {
    products: HashMap<ProductId, Product>,
    before: HashMap<ProductId, u64>,
}

impl StockDraft {
    async fn load<T: Transaction>(&mut self, tx: &mut T, id: ProductId) -> ServiceResult<Option<&mut Product>> {
        if !self.products.contains_key(&id) {
            match tx.get::<Product>(id).await? {
                Some(product) => {
                    self.before.insert(id, product.current_stock());
                    self.products.insert(id, product);
                }
                None => return Ok(None),
            }
        }
        Ok(self.products.get_mut(&id))
    }

    /// Put back the stock held by existing lines. Lines whose product no
    /// longer exists are skipped.
    async fn restore<T: Transaction>(&mut self, tx: &mut T, lines: &[OrderLine], now: DateTime<Utc>) -> ServiceResult<()> {
        for line in lines {
            match self.load(tx, line.product_id).await? {
                Some(product) => product.restore_stock(line.quantity, now),
                None => {
                    tracing::warn!(product_id = %line.product_id, quantity = line.quantity, "cannot restore stock for missing product");
                }
            }
        }
        Ok(())
    }

    /// Check and deduct stock for each requested item, pricing the lines from
    /// the catalog. Repeated products see earlier deductions.
    async fn reserve<T: Transaction>(
        &mut self,
        tx: &mut T,
        items: &[OrderItemRequest],
        quantities: &[u64],
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<OrderLine>> {
        let mut lines = Vec::with_capacity(items.len());
        for (i, (item, &quantity)) in items.iter().zip(quantities).enumerate() {
            if let Some(batch_id) = item.batch_id {
                let batch = require::<Batch, _>(tx, batch_id).await?;
                if batch.product_id() != item.product_id {
                    return Err(DomainError::validation(
                        format!("items[{i}].batchId"),
                        format!("batch {} does not belong to product {}", batch.batch_no(), item.product_id),
                    )
                    .into());
                }
            }

            let product = self
                .load(tx, item.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("product", item.product_id))?;
            product.deduct_stock(quantity, now)?;
            lines.push(OrderLine::new(item.product_id, item.batch_id, quantity, product.price()));
        }
        Ok(lines)
    }

    async fn save<T: Transaction>(&self, tx: &mut T) -> ServiceResult<()> {
        for product in self.products.values() {
            tx.update(product).await?;
        }
        Ok(())
    }

    /// Touched products with the signed stock change.
    fn into_changes(self) -> Vec<(Product, i64)> {
        let before = self.before;
        self.products
            .into_values()
            .map(|p| {
                let was = before.get(&p.id()).copied().unwrap_or(0);
                let delta = (p.current_stock() as i128 - was as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64;
                (p, delta)
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct OrderWorkflow<S> {
    store: Arc<S>,
    notifier: Notifier,
}

impl<S> Clone for OrderWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: self.notifier.clone(),
        }
    }
}

fn is_order_number_clash(err: &ServiceError) -> bool {
    matches!(err, ServiceError::Domain(DomainError::DuplicateKey { field, .. }) if field == "orderNo")
}

impl<S: DocumentStore> OrderWorkflow<S> {
    pub fn new(store: Arc<S>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    fn publish_stock(&self, changes: Vec<(Product, i64)>, action: StockAction, now: DateTime<Utc>) {
        for (product, delta) in changes {
            if delta != 0 {
                self.notifier.stock_changed(&product, action, delta, now);
            }
        }
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id, items = request.items.len()))]
    pub async fn create(&self, request: CreateOrderRequest, created_by: UserId) -> ServiceResult<Order> {
        let quantities = request.validate()?;

        let mut attempt = 1;
        let (order, customer, changes) = loop {
            match self.try_create(&request, &quantities, created_by).await {
                Err(err) if is_order_number_clash(&err) && attempt < ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(attempt, "order number already taken; retrying");
                    attempt += 1;
                }
                other => break other?,
            }
        };

        tracing::info!(order_id = %order.id(), order_no = %order.order_no(), net_amount = %order.net_amount(), "order created");
        let now = order.created_at();
        self.notifier.order_placed(&order, customer.name(), now);
        self.publish_stock(changes, StockAction::OrderPlaced, now);
        Ok(order)
    }

    async fn try_create(
        &self,
        request: &CreateOrderRequest,
        quantities: &[u64],
        created_by: UserId,
    ) -> ServiceResult<(Order, Customer, Vec<(Product, i64)>)> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let customer = require::<Customer, _>(&mut tx, request.customer_id).await?;

        let mut draft = StockDraft::default();
        let lines = draft.reserve(&mut tx, &request.items, quantities, now).await?;
        draft.save(&mut tx).await?;

        let date = now.date_naive();
        let sequence = tx.next_sequence(&OrderNumber::sequence_key(date)).await?;
        let order_no = OrderNumber::new(date, sequence)?;

        let order = Order::place(
            OrderId::new(),
            order_no,
            request.customer_id,
            lines,
            request.discount,
            request.tax,
            request.notes.clone(),
            created_by,
            now,
        )?;
        tx.insert(&order).await?;
        tx.commit().await?;

        Ok((order, customer, draft.into_changes()))
    }

    /// Edit a pending order. New items replace the old ones wholesale: the old
    /// reservation is released before the new one is taken.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: OrderId, request: UpdateOrderRequest) -> ServiceResult<Order> {
        let quantities = request.validate()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut order = require::<Order, _>(&mut tx, id).await?;
        order.ensure_editable()?;

        let mut draft = StockDraft::default();
        let items = match (&request.items, &quantities) {
            (Some(items), Some(quantities)) => {
                draft.restore(&mut tx, order.items(), now).await?;
                Some(draft.reserve(&mut tx, items, quantities, now).await?)
            }
            _ => None,
        };

        order.revise(
            OrderRevision {
                items,
                discount: request.discount,
                tax: request.tax,
                notes: request.notes,
            },
            now,
        )?;
        draft.save(&mut tx).await?;
        tx.update(&order).await?;
        tx.commit().await?;

        tracing::info!(order_no = %order.order_no(), net_amount = %order.net_amount(), "order updated");
        self.publish_stock(draft.into_changes(), StockAction::OrderUpdated, now);
        Ok(order)
    }

    /// Remove an order and put its stock back, whatever its status.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> ServiceResult<()> {
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let order = require::<Order, _>(&mut tx, id).await?;
        let mut draft = StockDraft::default();
        draft.restore(&mut tx, order.items(), now).await?;
        draft.save(&mut tx).await?;
        tx.delete::<Order>(id).await?;
        tx.commit().await?;

        tracing::info!(order_no = %order.order_no(), status = %order.status(), "order deleted");
        self.publish_stock(draft.into_changes(), StockAction::OrderDeleted, now);
        Ok(())
    }

    /// Move an order along its lifecycle. Stock is not adjusted.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> ServiceResult<Order> {
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut order = require::<Order, _>(&mut tx, id).await?;
        let previous = order.change_status(status, now)?;
        tx.update(&order).await?;
        tx.commit().await?;

        tracing::info!(order_no = %order.order_no(), from = %previous, to = %status, "order status changed");
        self.notifier.status_changed(&order, previous, now);
        Ok(order)
    }

    pub async fn get(&self, id: OrderId) -> ServiceResult<Order> {
        let mut tx = self.store.begin().await?;
        let order = require::<Order, _>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Newest first.
    pub async fn list(&self, query: OrderQuery) -> ServiceResult<Page<Order>> {
        query.page.validate()?;

        let mut tx = self.store.begin().await?;
        let orders = tx.list::<Order>().await?;
        let needle = query.search.as_deref().map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let customer_names: HashMap<CustomerId, String> = if needle.is_empty() {
            HashMap::new()
        } else {
            tx.list::<Customer>()
                .await?
                .into_iter()
                .map(|c| (c.id(), c.name().to_lowercase()))
                .collect()
        };
        tx.commit().await?;

        let matches_search = |o: &Order| {
            needle.is_empty()
                || o.order_no().to_string().to_lowercase().contains(&needle)
                || customer_names.get(&o.customer_id()).is_some_and(|name| name.contains(&needle))
        };
        let mut orders: Vec<Order> = orders
            .into_iter()
            .filter(|o| query.status.is_none_or(|s| o.status() == s))
            .filter(|o| query.customer_id.is_none_or(|c| o.customer_id() == c))
            .filter(|o| matches_search(o))
            .collect();
        orders.sort_by(|a, b| (b.created_at(), b.id()).cmp(&(a.created_at(), a.id())));

        Ok(paginate(orders, query.page)?)
    }

    pub async fn invoice(&self, id: OrderId) -> ServiceResult<Invoice> {
        let mut tx = self.store.begin().await?;
        let order = require::<Order, _>(&mut tx, id).await?;
        let customer = require::<Customer, _>(&mut tx, order.customer_id()).await?;

        let mut lines = Vec::with_capacity(order.items().len());
        for line in order.items() {
            let product = tx.get::<Product>(line.product_id).await?;
            let batch_no = match line.batch_id {
                Some(batch_id) => tx.get::<Batch>(batch_id).await?.map(|b| b.batch_no().to_string()),
                None => None,
            };
            lines.push(InvoiceLine {
                product_id: line.product_id,
                product_name: product.as_ref().map(|p| p.name().to_string()),
                sku: product.as_ref().map(|p| p.sku().to_string()),
                category: product.as_ref().map(|p| p.category().to_string()),
                batch_id: line.batch_id,
                batch_no,
                quantity: line.quantity,
                price: line.price,
                amount: line.amount().unwrap_or(Money::ZERO),
            });
        }
        tx.commit().await?;

        let contact = customer.contact();
        Ok(Invoice {
            order_id: order.id(),
            order_no: order.order_no().to_string(),
            status: order.status(),
            created_at: order.created_at(),
            created_by: order.created_by(),
            customer: InvoiceCustomer {
                id: customer.id(),
                name: contact.name().to_string(),
                email: contact.email().to_string(),
                phone: contact.phone().to_string(),
                address: contact.address().to_string(),
            },
            lines,
            subtotal: order.subtotal(),
            discount: order.discount(),
            tax: order.tax(),
            net_amount: order.net_amount(),
            notes: order.notes().map(str::to_string),
        })
    }
}
