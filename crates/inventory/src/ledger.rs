//! Stock derived from batches.

use crate::Batch;

/// Sum of batch quantities: the authoritative stock of a product.
pub fn total_quantity<'a>(batches: impl IntoIterator<Item = &'a Batch>) -> u64 {
    batches
        .into_iter()
        .fold(0u64, |acc, b| acc.saturating_add(b.quantity()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use wholesale_core::{BatchId, ProductId};

    use super::*;
    use crate::NewBatch;

    fn batch(product_id: ProductId, no: &str, qty: i64) -> Batch {
        let now = Utc::now();
        Batch::create(
            BatchId::new(),
            NewBatch {
                product_id,
                batch_no: no.into(),
                quantity: qty,
                manufactured_date: now - Duration::days(1),
                expiry_date: now + Duration::days(90),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(total_quantity(&Vec::<Batch>::new()), 0);
    }

    #[test]
    fn sums_all_batches() {
        let p = ProductId::new();
        let batches = vec![batch(p, "B1", 5), batch(p, "B2", 3)];
        assert_eq!(total_quantity(&batches), 8);
        assert_eq!(total_quantity(&batches[1..]), 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the total equals the arithmetic sum and does not depend on order.
            #[test]
            fn total_is_order_independent(qtys in proptest::collection::vec(0i64..100_000, 0..20)) {
                let p = ProductId::new();
                let mut batches: Vec<Batch> = qtys
                    .iter()
                    .enumerate()
                    .map(|(i, q)| batch(p, &format!("B{i}"), *q))
                    .collect();
                let expected: i64 = qtys.iter().sum();
                prop_assert_eq!(total_quantity(&batches), expected as u64);
                batches.reverse();
                prop_assert_eq!(total_quantity(&batches), expected as u64);
            }
        }
    }
}
