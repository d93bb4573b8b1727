//! Stock ledger recalculation: `currentStock := Σ batch.quantity`.

use chrono::{DateTime, Utc};

use wholesale_core::ProductId;
use wholesale_inventory::{Batch, total_quantity};
use wholesale_products::Product;

use crate::error::ServiceResult;
use crate::store::{DocumentStore, Transaction, require};

/// Outcome of a recalculation: the product as written and the stock it held
/// just before.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculated {
    pub previous: u64,
    pub product: Product,
}

impl Recalculated {
    /// Signed change applied to `currentStock`.
    pub fn delta(&self) -> i64 {
        let signed = |q: u64| i64::try_from(q).unwrap_or(i64::MAX);
        signed(self.product.current_stock()).saturating_sub(signed(self.previous))
    }
}

/// Recalculate inside an open transaction.
pub async fn recalculate_in<T: Transaction>(
    tx: &mut T,
    product_id: ProductId,
    now: DateTime<Utc>,
) -> ServiceResult<Recalculated> {
    let mut product = require::<Product, _>(tx, product_id).await?;
    let previous = product.current_stock();
    let batches = tx.find_by::<Batch>("productId", &product_id.to_string()).await?;
    product.set_stock(total_quantity(&batches), now);
    tx.update(&product).await?;
    Ok(Recalculated { previous, product })
}

/// Recalculate in a transaction of its own; errors propagate.
pub async fn recalculate<S: DocumentStore>(
    store: &S,
    product_id: ProductId,
    now: DateTime<Utc>,
) -> ServiceResult<Recalculated> {
    let mut tx = store.begin().await?;
    let outcome = recalculate_in(&mut tx, product_id, now).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Recalculate after a batch mutation has committed. Failures are logged and
/// the batch operation stands.
pub async fn recalculate_best_effort<S: DocumentStore>(
    store: &S,
    product_id: ProductId,
    now: DateTime<Utc>,
) -> Option<Recalculated> {
    match recalculate(store, product_id, now).await {
        Ok(outcome) => Some(outcome),
        Err(error) => {
            tracing::warn!(%error, %product_id, "stock recalculation failed");
            None
        }
    }
}
