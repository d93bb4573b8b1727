//! Order totals.

use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult, Money};

use crate::order::OrderLine;

/// `subtotal = Σ quantity × price`, `netAmount = subtotal − discount + tax`.
///
/// Amounts are exact cents, so the two-decimal rounding of the totals is
/// already applied to each line price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub net_amount: Money,
}

impl OrderTotals {
    pub fn compute(lines: &[OrderLine], discount: Money, tax: Money) -> DomainResult<Self> {
        if discount.is_negative() {
            return Err(DomainError::validation("discount", "discount cannot be negative"));
        }
        if tax.is_negative() {
            return Err(DomainError::validation("tax", "tax cannot be negative"));
        }

        let overflow = || DomainError::validation("items", "order total is too large");

        let mut subtotal = Money::ZERO;
        for line in lines {
            let amount = line.amount().ok_or_else(overflow)?;
            subtotal = subtotal.checked_add(amount).ok_or_else(overflow)?;
        }

        let net_amount = subtotal
            .checked_sub(discount)
            .and_then(|m| m.checked_add(tax))
            .ok_or_else(overflow)?;
        if net_amount.is_negative() {
            return Err(DomainError::validation(
                "discount",
                format!("discount {discount} exceeds subtotal plus tax"),
            ));
        }

        Ok(Self {
            subtotal,
            discount,
            tax,
            net_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use wholesale_core::{ProductId, round2};

    use super::*;

    fn line(qty: u64, cents: i64) -> OrderLine {
        OrderLine::new(ProductId::new(), None, qty, Money::from_cents(cents))
    }

    #[test]
    fn net_is_subtotal_minus_discount_plus_tax() {
        let lines = [line(4, 1050), line(1, 299)];
        let t = OrderTotals::compute(&lines, Money::from_cents(100), Money::from_cents(250)).unwrap();
        assert_eq!(t.subtotal, Money::from_cents(4499));
        assert_eq!(t.net_amount, Money::from_cents(4649));
    }

    #[test]
    fn discount_larger_than_total_is_rejected() {
        let err = OrderTotals::compute(&[line(1, 500)], Money::from_cents(600), Money::ZERO).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field, .. } if field == "discount"));
    }

    #[test]
    fn negative_tax_is_rejected() {
        assert!(OrderTotals::compute(&[line(1, 500)], Money::ZERO, Money::from_cents(-1)).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: totals agree with the decimal formulas rounded to two places.
            #[test]
            fn totals_match_decimal_formula(
                items in proptest::collection::vec((1u64..500, 0i64..100_000), 1..10),
                discount in 0i64..10_000,
                tax in 0i64..10_000,
            ) {
                let lines: Vec<OrderLine> = items.iter().map(|(q, c)| line(*q, *c)).collect();
                let gross: f64 = items.iter().map(|(q, c)| *q as f64 * (*c as f64 / 100.0)).sum();

                match OrderTotals::compute(&lines, Money::from_cents(discount), Money::from_cents(tax)) {
                    Ok(t) => {
                        prop_assert!((t.subtotal.to_major() - round2(gross)).abs() < 0.005);
                        let net = round2(t.subtotal.to_major() - discount as f64 / 100.0 + tax as f64 / 100.0);
                        prop_assert!((t.net_amount.to_major() - net).abs() < 0.005);
                        prop_assert_eq!(
                            t.net_amount.cents(),
                            t.subtotal.cents() - discount + tax
                        );
                    }
                    Err(_) => {
                        let subtotal: i64 = items.iter().map(|(q, c)| *q as i64 * c).sum();
                        prop_assert!(subtotal - discount + tax < 0);
                    }
                }
            }
        }
    }
}
