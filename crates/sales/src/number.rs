//! Order numbers: `ORD-<YYYYMMDD>-<NNNN>`.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, ValueObject};

const PREFIX: &str = "ORD-";

/// Human-facing order identifier, unique across all orders.
///
/// The sequence restarts at 1 every UTC day and is zero-padded to at least
/// four digits (`ORD-20240315-0007`, `ORD-20240315-12345`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    date: NaiveDate,
    sequence: u32,
}

impl ValueObject for OrderNumber {}

impl OrderNumber {
    pub fn new(date: NaiveDate, sequence: u32) -> Result<Self, DomainError> {
        if sequence == 0 {
            return Err(DomainError::validation("orderNo", "sequence starts at 1"));
        }
        Ok(Self { date, sequence })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Store counter key for the given date (`order-seq:YYYYMMDD`).
    pub fn sequence_key(date: NaiveDate) -> String {
        format!("order-seq:{}", date.format("%Y%m%d"))
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{PREFIX}{}-{:04}", self.date.format("%Y%m%d"), self.sequence)
    }
}

impl FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation("orderNo", format!("'{s}' is not an order number"));

        let rest = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (date, seq) = rest.split_once('-').ok_or_else(invalid)?;
        if date.len() != 8 || seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
        let sequence: u32 = seq.parse().map_err(|_| invalid())?;
        // Reject non-canonical padding such as `00012`.
        if seq.len() > 4 && seq.starts_with('0') {
            return Err(invalid());
        }
        Self::new(date, sequence)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.to_string()
    }
}
