use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{BatchId, DomainError, DomainResult, Entity, ProductId};

/// Window (in days) used for near-expiry alerts and reports.
pub const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 30;

/// How soon a batch expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryUrgency {
    /// 7 days or fewer.
    Critical,
    /// 8 to 14 days.
    Urgent,
    Warning,
}

impl ExpiryUrgency {
    pub fn from_days(days_until_expiry: i64) -> Self {
        match days_until_expiry {
            d if d <= 7 => ExpiryUrgency::Critical,
            d if d <= 14 => ExpiryUrgency::Urgent,
            _ => ExpiryUrgency::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryUrgency::Critical => "critical",
            ExpiryUrgency::Urgent => "urgent",
            ExpiryUrgency::Warning => "warning",
        }
    }
}

/// Trim and upper-case a batch number.
pub fn normalize_batch_no(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn quantity(value: i64) -> DomainResult<u64> {
    u64::try_from(value).map_err(|_| DomainError::validation("quantity", "quantity cannot be negative"))
}

fn ensure_dates(manufactured: DateTime<Utc>, expiry: DateTime<Utc>) -> DomainResult<()> {
    if expiry <= manufactured {
        return Err(DomainError::validation(
            "expiryDate",
            "expiry date must be after manufactured date",
        ));
    }
    Ok(())
}

/// Input for receiving a new batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub product_id: ProductId,
    pub batch_no: String,
    /// Signed so that negative input is reported as a validation failure.
    pub quantity: i64,
    pub manufactured_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

/// Partial update. `batchNo` and `productId` may be echoed back unchanged but
/// not modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPatch {
    pub batch_no: Option<String>,
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
    pub manufactured_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// A received lot of a product with its own expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    id: BatchId,
    product_id: ProductId,
    batch_no: String,
    quantity: u64,
    manufactured_date: DateTime<Utc>,
    expiry_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> BatchId {
        self.id
    }
}

impl Batch {
    pub fn create(id: BatchId, input: NewBatch, now: DateTime<Utc>) -> DomainResult<Self> {
        let batch_no = normalize_batch_no(&input.batch_no);
        if batch_no.is_empty() {
            return Err(DomainError::validation("batchNo", "batch number cannot be empty"));
        }
        let quantity = quantity(input.quantity)?;
        ensure_dates(input.manufactured_date, input.expiry_date)?;

        Ok(Self {
            id,
            product_id: input.product_id,
            batch_no,
            quantity,
            manufactured_date: input.manufactured_date,
            expiry_date: input.expiry_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn batch_no(&self) -> &str {
        &self.batch_no
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn manufactured_date(&self) -> DateTime<Utc> {
        self.manufactured_date
    }

    pub fn expiry_date(&self) -> DateTime<Utc> {
        self.expiry_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a partial update; returns whether the quantity changed.
    ///
    /// The date ordering is checked on the merged result, so moving only one
    /// of the two dates is still validated against the other.
    pub fn apply_patch(&mut self, patch: BatchPatch, now: DateTime<Utc>) -> DomainResult<bool> {
        if let Some(batch_no) = &patch.batch_no {
            if normalize_batch_no(batch_no) != self.batch_no {
                return Err(DomainError::validation("batchNo", "batch number cannot be changed"));
            }
        }
        if let Some(product_id) = patch.product_id {
            if product_id != self.product_id {
                return Err(DomainError::validation("productId", "batch product cannot be changed"));
            }
        }

        let new_quantity = patch.quantity.map(quantity).transpose()?;
        let manufactured = patch.manufactured_date.unwrap_or(self.manufactured_date);
        let expiry = patch.expiry_date.unwrap_or(self.expiry_date);
        ensure_dates(manufactured, expiry)?;

        let changed = new_quantity.is_some_and(|q| q != self.quantity);
        if let Some(q) = new_quantity {
            self.quantity = q;
        }
        self.manufactured_date = manufactured;
        self.expiry_date = expiry;
        self.updated_at = now;
        Ok(changed)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }

    /// Expiry falls in `(now, now + days]`.
    pub fn is_near_expiry(&self, now: DateTime<Utc>, days: i64) -> bool {
        self.expiry_date > now && self.expiry_date <= now + Duration::days(days)
    }

    /// Whole days until expiry, rounded to the nearest day (negative once expired).
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        let seconds = (self.expiry_date - now).num_seconds() as f64;
        (seconds / 86_400.0).round() as i64
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> ExpiryUrgency {
        ExpiryUrgency::from_days(self.days_until_expiry(now))
    }
}
