//! Read-only reports over the catalog, batches and orders.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{BatchId, DomainError, Entity, Money, ProductId, SupplierId, round2};
use wholesale_inventory::{Batch, ExpiryUrgency};
use wholesale_products::Product;
use wholesale_sales::{Order, OrderStatus};

use crate::error::ServiceResult;
use crate::policy::StockPolicy;
use crate::store::{DocumentStore, Transaction};

pub const DEFAULT_TOP_PRODUCTS: usize = 10;
const MAX_TOP_PRODUCTS: usize = 100;

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { round2(total / count as f64) }
}

// Inventory summary

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTotals {
    pub total_products: usize,
    pub total_stock: u64,
    pub total_value: Money,
    pub avg_price: f64,
    pub low_stock_items: usize,
    pub zero_stock_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub product_count: usize,
    pub total_stock: u64,
    pub total_value: Money,
    pub avg_price: f64,
    pub avg_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    pub total_batches: usize,
    pub total_batch_quantity: u64,
    pub avg_batch_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub overall_totals: InventoryTotals,
    /// Most valuable category first.
    pub category_breakdown: Vec<CategorySummary>,
    pub batch_statistics: BatchStatistics,
}

// Low stock

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LowStockSort {
    /// Lowest stock first.
    #[default]
    Stock,
    /// Most valuable first.
    Value,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: Money,
    pub current_stock: u64,
    pub total_value: Money,
    pub batch_count: usize,
    pub nearest_expiry: Option<DateTime<Utc>>,
    pub supplier_id: Option<SupplierId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockSummary {
    pub total_low_stock_items: usize,
    pub total_value: Money,
    pub avg_stock: f64,
    /// Products with no stock at all.
    pub critical_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockReport {
    pub threshold: u64,
    pub summary: LowStockSummary,
    pub products: Vec<LowStockItem>,
}

// Expiry

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpirySort {
    /// Soonest first.
    #[default]
    Expiry,
    /// Largest first.
    Quantity,
    Product,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringBatch {
    pub batch_id: BatchId,
    pub batch_no: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub category: String,
    pub quantity: u64,
    pub price: Money,
    pub batch_value: Money,
    pub manufactured_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub urgency: ExpiryUrgency,
}

impl ExpiringBatch {
    fn new(batch: &Batch, product: &Product, now: DateTime<Utc>) -> Self {
        Self {
            batch_id: batch.id(),
            batch_no: batch.batch_no().to_string(),
            product_id: product.id(),
            product_name: product.name().to_string(),
            sku: product.sku().to_string(),
            category: product.category().to_string(),
            quantity: batch.quantity(),
            price: product.price(),
            batch_value: product.price().checked_mul(batch.quantity()).unwrap_or(Money::ZERO),
            manufactured_date: batch.manufactured_date(),
            expiry_date: batch.expiry_date(),
            days_until_expiry: batch.days_until_expiry(now),
            urgency: batch.urgency(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryWindow {
    pub days: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearExpirySummary {
    pub total_batches: usize,
    pub total_value: Money,
    pub total_quantity: u64,
    pub critical_batches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrgencyGroups {
    pub critical: Vec<ExpiringBatch>,
    pub urgent: Vec<ExpiringBatch>,
    pub warning: Vec<ExpiringBatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearExpiryReport {
    pub threshold: ExpiryWindow,
    pub summary: NearExpirySummary,
    pub categorized: UrgencyGroups,
    pub all_batches: Vec<ExpiringBatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredReport {
    pub total_batches: usize,
    pub total_quantity: u64,
    pub total_value: Money,
    /// Most recently expired first.
    pub batches: Vec<ExpiringBatch>,
}

// Sales

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SalesGrouping {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl SalesGrouping {
    fn period(&self, at: DateTime<Utc>) -> String {
        match self {
            SalesGrouping::Daily => at.format("%Y-%m-%d").to_string(),
            SalesGrouping::Monthly => at.format("%Y-%m").to_string(),
            SalesGrouping::Yearly => at.format("%Y").to_string(),
        }
    }
}

/// Inclusive date range. `start` defaults to the first day of the current
/// month; `end` defaults to now and always extends to the end of its day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    fn resolve(&self, now: DateTime<Utc>) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = match self.start {
            Some(start) => start,
            None => {
                let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
                Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN))
            }
        };
        let end_day = self.end.unwrap_or(now).date_naive();
        let end = Utc.from_utc_datetime(&end_day.and_time(NaiveTime::MIN)) + Duration::days(1)
            - Duration::milliseconds(1);
        if start > end {
            return Err(DomainError::validation("startDate", "start date is after end date").into());
        }
        Ok((start, end))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<SalesGrouping>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesBucket {
    pub period: String,
    pub order_count: usize,
    pub revenue: Money,
    pub units_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub order_count: usize,
    pub revenue: Money,
    pub units_sold: u64,
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub period: SalesPeriod,
    /// Oldest period first.
    pub sales_data: Vec<SalesBucket>,
    pub totals: SalesTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: ProductId,
    /// Absent if the product has since been removed.
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub units_sold: u64,
    pub revenue: Money,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductsReport {
    pub period: SalesPeriod,
    pub top_products: Vec<TopProduct>,
    pub count: usize,
}

#[derive(Debug)]
pub struct ReportService<S> {
    store: Arc<S>,
    policy: StockPolicy,
}

impl<S> Clone for ReportService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: DocumentStore> ReportService<S> {
    pub fn new(store: Arc<S>, policy: StockPolicy) -> Self {
        Self { store, policy }
    }

    async fn catalog(&self) -> ServiceResult<(Vec<Product>, Vec<Batch>)> {
        let mut tx = self.store.begin().await?;
        let products = tx.list::<Product>().await?;
        let batches = tx.list::<Batch>().await?;
        tx.commit().await?;
        Ok((products, batches))
    }

    /// Orders that count as sales (not cancelled) created inside the range.
    async fn sales_in(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> ServiceResult<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        let orders = tx.list::<Order>().await?;
        tx.commit().await?;
        Ok(orders
            .into_iter()
            .filter(|o| o.status() != OrderStatus::Cancelled)
            .filter(|o| o.created_at() >= from && o.created_at() <= to)
            .collect())
    }

    pub async fn inventory_summary(&self) -> ServiceResult<InventorySummary> {
        let (products, batches) = self.catalog().await?;
        let threshold = self.policy.low_stock_threshold;

        let mut categories: BTreeMap<&str, Vec<&Product>> = BTreeMap::new();
        for p in &products {
            categories.entry(p.category()).or_default().push(p);
        }
        let mut category_breakdown: Vec<CategorySummary> = categories
            .into_iter()
            .map(|(category, items)| {
                let total_stock: u64 = items.iter().map(|p| p.current_stock()).sum();
                CategorySummary {
                    category: category.to_string(),
                    product_count: items.len(),
                    total_stock,
                    total_value: items.iter().map(|p| p.stock_value()).sum(),
                    avg_price: mean(items.iter().map(|p| p.price().to_major()).sum(), items.len()),
                    avg_stock: mean(total_stock as f64, items.len()),
                }
            })
            .collect();
        category_breakdown.sort_by(|a, b| b.total_value.cmp(&a.total_value));

        let total_batch_quantity: u64 = batches.iter().map(Batch::quantity).sum();
        Ok(InventorySummary {
            overall_totals: InventoryTotals {
                total_products: products.len(),
                total_stock: products.iter().map(Product::current_stock).sum(),
                total_value: products.iter().map(Product::stock_value).sum(),
                avg_price: mean(products.iter().map(|p| p.price().to_major()).sum(), products.len()),
                low_stock_items: products.iter().filter(|p| p.is_low_stock(threshold)).count(),
                zero_stock_items: products.iter().filter(|p| p.current_stock() == 0).count(),
            },
            category_breakdown,
            batch_statistics: BatchStatistics {
                total_batches: batches.len(),
                total_batch_quantity,
                avg_batch_quantity: mean(total_batch_quantity as f64, batches.len()),
            },
        })
    }

    pub async fn low_stock(&self, threshold: Option<u64>, sort_by: LowStockSort) -> ServiceResult<LowStockReport> {
        let threshold = threshold.unwrap_or(self.policy.low_stock_threshold);
        let (products, batches) = self.catalog().await?;

        let mut by_product: HashMap<ProductId, Vec<&Batch>> = HashMap::new();
        for b in &batches {
            by_product.entry(b.product_id()).or_default().push(b);
        }

        let mut items: Vec<LowStockItem> = products
            .iter()
            .filter(|p| p.is_low_stock(threshold))
            .map(|p| {
                let own = by_product.get(&p.id()).map(Vec::as_slice).unwrap_or_default();
                LowStockItem {
                    product_id: p.id(),
                    name: p.name().to_string(),
                    sku: p.sku().to_string(),
                    category: p.category().to_string(),
                    price: p.price(),
                    current_stock: p.current_stock(),
                    total_value: p.stock_value(),
                    batch_count: own.len(),
                    nearest_expiry: own.iter().map(|b| b.expiry_date()).min(),
                    supplier_id: p.supplier_id(),
                }
            })
            .collect();

        match sort_by {
            LowStockSort::Stock => items.sort_by_key(|i| i.current_stock),
            LowStockSort::Value => items.sort_by(|a, b| b.total_value.cmp(&a.total_value)),
            LowStockSort::Category => items.sort_by(|a, b| {
                (a.category.as_str(), a.current_stock).cmp(&(b.category.as_str(), b.current_stock))
            }),
        }

        let total_stock: u64 = items.iter().map(|i| i.current_stock).sum();
        Ok(LowStockReport {
            threshold,
            summary: LowStockSummary {
                total_low_stock_items: items.len(),
                total_value: items.iter().map(|i| i.total_value).sum(),
                avg_stock: mean(total_stock as f64, items.len()),
                critical_items: items.iter().filter(|i| i.current_stock == 0).count(),
            },
            products: items,
        })
    }

    pub async fn near_expiry(&self, days: Option<i64>, sort_by: ExpirySort) -> ServiceResult<NearExpiryReport> {
        let days = days.unwrap_or(self.policy.near_expiry_days);
        if days < 0 {
            return Err(DomainError::validation("days", "days cannot be negative").into());
        }
        let now = Utc::now();
        let (products, batches) = self.catalog().await?;
        let products: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id(), p)).collect();

        let mut all: Vec<ExpiringBatch> = batches
            .iter()
            .filter(|b| b.is_near_expiry(now, days))
            .filter_map(|b| products.get(&b.product_id()).map(|p| ExpiringBatch::new(b, p, now)))
            .collect();

        match sort_by {
            ExpirySort::Expiry => all.sort_by_key(|b| b.expiry_date),
            ExpirySort::Quantity => all.sort_by(|a, b| b.quantity.cmp(&a.quantity)),
            ExpirySort::Product => all.sort_by(|a, b| {
                (a.product_name.as_str(), a.expiry_date).cmp(&(b.product_name.as_str(), b.expiry_date))
            }),
        }

        let mut categorized = UrgencyGroups::default();
        for b in &all {
            match b.urgency {
                ExpiryUrgency::Critical => categorized.critical.push(b.clone()),
                ExpiryUrgency::Urgent => categorized.urgent.push(b.clone()),
                ExpiryUrgency::Warning => categorized.warning.push(b.clone()),
            }
        }

        Ok(NearExpiryReport {
            threshold: ExpiryWindow {
                days,
                start_date: now,
                end_date: now + Duration::days(days),
            },
            summary: NearExpirySummary {
                total_batches: all.len(),
                total_value: all.iter().map(|b| b.batch_value).sum(),
                total_quantity: all.iter().map(|b| b.quantity).sum(),
                critical_batches: categorized.critical.len(),
            },
            categorized,
            all_batches: all,
        })
    }

    pub async fn expired(&self) -> ServiceResult<ExpiredReport> {
        let now = Utc::now();
        let (products, batches) = self.catalog().await?;
        let products: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id(), p)).collect();

        let mut expired: Vec<ExpiringBatch> = batches
            .iter()
            .filter(|b| b.is_expired(now))
            .filter_map(|b| products.get(&b.product_id()).map(|p| ExpiringBatch::new(b, p, now)))
            .collect();
        expired.sort_by(|a, b| b.expiry_date.cmp(&a.expiry_date));

        Ok(ExpiredReport {
            total_batches: expired.len(),
            total_quantity: expired.iter().map(|b| b.quantity).sum(),
            total_value: expired.iter().map(|b| b.batch_value).sum(),
            batches: expired,
        })
    }

    pub async fn sales(&self, range: DateRange, group_by: SalesGrouping) -> ServiceResult<SalesReport> {
        let (from, to) = range.resolve(Utc::now())?;
        let orders = self.sales_in(from, to).await?;

        let mut buckets: BTreeMap<String, SalesBucket> = BTreeMap::new();
        for order in &orders {
            let period = group_by.period(order.created_at());
            let bucket = buckets.entry(period.clone()).or_insert_with(|| SalesBucket {
                period,
                order_count: 0,
                revenue: Money::ZERO,
                units_sold: 0,
            });
            bucket.order_count += 1;
            bucket.revenue += order.net_amount();
            bucket.units_sold += order.units();
        }

        let revenue: Money = orders.iter().map(Order::net_amount).sum();
        Ok(SalesReport {
            period: SalesPeriod {
                start_date: from,
                end_date: to,
                group_by: Some(group_by),
            },
            sales_data: buckets.into_values().collect(),
            totals: SalesTotals {
                order_count: orders.len(),
                revenue,
                units_sold: orders.iter().map(Order::units).sum(),
                avg_order_value: mean(revenue.to_major(), orders.len()),
            },
        })
    }

    /// Best sellers by units, ties broken by revenue.
    pub async fn top_products(&self, range: DateRange, limit: Option<usize>) -> ServiceResult<TopProductsReport> {
        let limit = limit.unwrap_or(DEFAULT_TOP_PRODUCTS);
        if limit == 0 || limit > MAX_TOP_PRODUCTS {
            return Err(DomainError::validation(
                "limit",
                format!("limit must be between 1 and {MAX_TOP_PRODUCTS}"),
            )
            .into());
        }
        let (from, to) = range.resolve(Utc::now())?;
        let orders = self.sales_in(from, to).await?;
        let (products, _) = self.catalog().await?;
        let products: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id(), p)).collect();

        let mut tally: HashMap<ProductId, TopProduct> = HashMap::new();
        for order in &orders {
            let mut seen = Vec::new();
            for line in order.items() {
                let entry = tally.entry(line.product_id).or_insert_with(|| {
                    let product = products.get(&line.product_id);
                    TopProduct {
                        product_id: line.product_id,
                        name: product.map(|p| p.name().to_string()),
                        sku: product.map(|p| p.sku().to_string()),
                        category: product.map(|p| p.category().to_string()),
                        units_sold: 0,
                        revenue: Money::ZERO,
                        order_count: 0,
                    }
                });
                entry.units_sold += line.quantity;
                entry.revenue += line.amount().unwrap_or(Money::ZERO);
                if !seen.contains(&line.product_id) {
                    seen.push(line.product_id);
                    entry.order_count += 1;
                }
            }
        }

        let mut top: Vec<TopProduct> = tally.into_values().collect();
        top.sort_by(|a, b| {
            b.units_sold
                .cmp(&a.units_sold)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.product_id.cmp(&b.product_id))
        });
        top.truncate(limit);

        Ok(TopProductsReport {
            period: SalesPeriod {
                start_date: from,
                end_date: to,
                group_by: None,
            },
            count: top.len(),
            top_products: top,
        })
    }
}

#[cfg(test)]
mod tests {
    use wholesale_core::{BatchId, CustomerId, UserId};
    use wholesale_inventory::NewBatch;
    use wholesale_products::{NewProduct, Unit};
    use wholesale_sales::{OrderLine, OrderNumber};

    use super::*;
    use crate::store::InMemoryStore;

    async fn seed_product(store: &InMemoryStore, sku: &str, category: &str, cents: i64, stock: u64) -> Product {
        let mut p = Product::create(
            ProductId::new(),
            NewProduct {
                name: format!("Product {sku}"),
                sku: sku.into(),
                category: category.into(),
                unit: Unit::Piece,
                price: Money::from_cents(cents),
                supplier_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        p.set_stock(stock, Utc::now());
        let mut tx = store.begin().await.unwrap();
        tx.insert(&p).await.unwrap();
        tx.commit().await.unwrap();
        p
    }

    async fn seed_batch(store: &InMemoryStore, product: &Product, no: &str, qty: i64, expires_in_days: i64) {
        let now = Utc::now();
        let b = Batch::create(
            BatchId::new(),
            NewBatch {
                product_id: product.id(),
                batch_no: no.into(),
                quantity: qty,
                manufactured_date: now - Duration::days(100),
                expiry_date: now + Duration::days(expires_in_days),
            },
            now,
        )
        .unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&b).await.unwrap();
        tx.commit().await.unwrap();
    }

    async fn seed_order(store: &InMemoryStore, seq: u32, lines: Vec<(&Product, u64)>, status: OrderStatus) {
        let now = Utc::now();
        let mut order = Order::place(
            wholesale_core::OrderId::new(),
            OrderNumber::new(now.date_naive(), seq).unwrap(),
            CustomerId::new(),
            lines
                .into_iter()
                .map(|(p, q)| OrderLine::new(p.id(), None, q, p.price()))
                .collect(),
            Money::ZERO,
            Money::ZERO,
            None,
            UserId::new(),
            now,
        )
        .unwrap();
        if status == OrderStatus::Delivered {
            order.change_status(OrderStatus::Confirmed, now).unwrap();
        }
        if status != OrderStatus::Pending {
            order.change_status(status, now).unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        tx.insert(&order).await.unwrap();
        tx.commit().await.unwrap();
    }

    fn reports(store: &Arc<InMemoryStore>) -> ReportService<InMemoryStore> {
        ReportService::new(Arc::clone(store), StockPolicy::default())
    }

    #[tokio::test]
    async fn inventory_summary_totals_and_categories() {
        let store = Arc::new(InMemoryStore::new());
        let rice = seed_product(&store, "RICE", "Grains", 250, 40).await;
        seed_product(&store, "WHEAT", "Grains", 150, 0).await;
        seed_product(&store, "OIL", "Oils", 1200, 5).await;
        seed_batch(&store, &rice, "R1", 30, 60).await;
        seed_batch(&store, &rice, "R2", 10, 90).await;

        let summary = reports(&store).inventory_summary().await.unwrap();
        let totals = &summary.overall_totals;
        assert_eq!(totals.total_products, 3);
        assert_eq!(totals.total_stock, 45);
        assert_eq!(totals.total_value, Money::from_cents(250 * 40 + 1200 * 5));
        assert_eq!(totals.avg_price, 5.33);
        assert_eq!(totals.low_stock_items, 2);
        assert_eq!(totals.zero_stock_items, 1);

        assert_eq!(summary.category_breakdown[0].category, "Grains");
        assert_eq!(summary.category_breakdown[0].product_count, 2);
        assert_eq!(summary.category_breakdown[0].avg_stock, 20.0);
        assert_eq!(summary.batch_statistics.total_batches, 2);
        assert_eq!(summary.batch_statistics.avg_batch_quantity, 20.0);
    }

    #[tokio::test]
    async fn low_stock_report_with_nearest_expiry() {
        let store = Arc::new(InMemoryStore::new());
        let salt = seed_product(&store, "SALT", "Spices", 100, 3).await;
        seed_product(&store, "SUGAR", "Staples", 400, 0).await;
        seed_product(&store, "RICE", "Grains", 250, 50).await;
        seed_batch(&store, &salt, "S1", 1, 40).await;
        seed_batch(&store, &salt, "S2", 2, 10).await;

        let report = reports(&store).low_stock(None, LowStockSort::Stock).await.unwrap();
        assert_eq!(report.threshold, 10);
        assert_eq!(report.summary.total_low_stock_items, 2);
        assert_eq!(report.summary.critical_items, 1);
        assert_eq!(report.summary.avg_stock, 1.5);
        assert_eq!(report.products[0].sku, "SUGAR");
        assert_eq!(report.products[1].batch_count, 2);
        let nearest = report.products[1].nearest_expiry.unwrap();
        assert!(nearest < Utc::now() + Duration::days(11));

        let by_value = reports(&store).low_stock(Some(100), LowStockSort::Value).await.unwrap();
        assert_eq!(by_value.products[0].sku, "RICE");
    }

    #[tokio::test]
    async fn near_expiry_groups_by_urgency() {
        let store = Arc::new(InMemoryStore::new());
        let milk = seed_product(&store, "MILK", "Dairy", 50, 0).await;
        seed_batch(&store, &milk, "M1", 10, 3).await;
        seed_batch(&store, &milk, "M2", 20, 10).await;
        seed_batch(&store, &milk, "M3", 30, 25).await;
        seed_batch(&store, &milk, "M4", 40, 45).await;
        seed_batch(&store, &milk, "M0", 5, -1).await;

        let report = reports(&store).near_expiry(None, ExpirySort::Expiry).await.unwrap();
        assert_eq!(report.summary.total_batches, 3);
        assert_eq!(report.summary.total_quantity, 60);
        assert_eq!(report.summary.total_value, Money::from_cents(50 * 60));
        assert_eq!(report.summary.critical_batches, 1);
        assert_eq!(report.categorized.urgent[0].batch_no, "M2");
        assert_eq!(report.categorized.warning[0].batch_no, "M3");
        assert_eq!(report.all_batches[0].batch_no, "M1");

        let by_qty = reports(&store).near_expiry(Some(60), ExpirySort::Quantity).await.unwrap();
        assert_eq!(by_qty.all_batches[0].batch_no, "M4");

        let expired = reports(&store).expired().await.unwrap();
        assert_eq!(expired.total_batches, 1);
        assert_eq!(expired.batches[0].batch_no, "M0");
        assert!(expired.batches[0].days_until_expiry < 0);
    }

    #[tokio::test]
    async fn sales_excludes_cancelled_orders() {
        let store = Arc::new(InMemoryStore::new());
        let rice = seed_product(&store, "RICE", "Grains", 250, 100).await;
        let oil = seed_product(&store, "OIL", "Oils", 1000, 100).await;
        seed_order(&store, 1, vec![(&rice, 4), (&oil, 1)], OrderStatus::Pending).await;
        seed_order(&store, 2, vec![(&oil, 2)], OrderStatus::Delivered).await;
        seed_order(&store, 3, vec![(&rice, 50)], OrderStatus::Cancelled).await;

        let report = reports(&store).sales(DateRange::default(), SalesGrouping::Daily).await.unwrap();
        assert_eq!(report.totals.order_count, 2);
        assert_eq!(report.totals.revenue, Money::from_cents(2000 + 2000));
        assert_eq!(report.totals.units_sold, 7);
        assert_eq!(report.totals.avg_order_value, 20.0);
        assert_eq!(report.sales_data.len(), 1);
        assert_eq!(report.sales_data[0].period, Utc::now().format("%Y-%m-%d").to_string());

        let top = reports(&store).top_products(DateRange::default(), Some(1)).await.unwrap();
        assert_eq!(top.count, 1);
        assert_eq!(top.top_products[0].sku.as_deref(), Some("RICE"));
        assert_eq!(top.top_products[0].units_sold, 4);
    }

    #[test]
    fn range_defaults_to_month_to_date_through_end_of_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let (start, end) = DateRange::default().resolve(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end.date_naive(), now.date_naive());
        assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");

        let inverted = DateRange {
            start: Some(now + Duration::days(3)),
            end: Some(now),
        };
        assert!(inverted.resolve(now).is_err());
    }

    #[tokio::test]
    async fn top_products_limit_is_validated() {
        let store = Arc::new(InMemoryStore::new());
        assert!(reports(&store).top_products(DateRange::default(), Some(0)).await.is_err());
        assert!(reports(&store).top_products(DateRange::default(), Some(101)).await.is_err());
    }
}
