use wholesale_inventory::DEFAULT_NEAR_EXPIRY_DAYS;
use wholesale_products::DEFAULT_LOW_STOCK_THRESHOLD;

/// Thresholds for stock alerts and report defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPolicy {
    /// Products with stock strictly below this are low on stock.
    pub low_stock_threshold: u64,
    /// Batches expiring within this many days are near expiry.
    pub near_expiry_days: i64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            near_expiry_days: DEFAULT_NEAR_EXPIRY_DAYS,
        }
    }
}
