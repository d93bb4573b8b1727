use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{CustomerId, DomainResult, Entity};

use crate::contact::{ContactInfo, ContactPatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

pub type CustomerPatch = ContactPatch;

/// A buyer that orders are placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: CustomerId,
    #[serde(flatten)]
    contact: ContactInfo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

impl Customer {
    pub fn create(id: CustomerId, input: NewCustomer, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            contact: ContactInfo::new(&input.name, &input.email, &input.phone, &input.address)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn name(&self) -> &str {
        self.contact.name()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn apply_patch(&mut self, patch: CustomerPatch, now: DateTime<Utc>) -> DomainResult<()> {
        self.contact.apply(patch)?;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_contact_fields_flat() {
        let customer = Customer::create(
            CustomerId::new(),
            NewCustomer {
                name: "Sharma Stores".into(),
                email: "Orders@Sharma.in".into(),
                phone: "9123456780".into(),
                address: "4 Station Road".into(),
            },
            Utc::now(),
        )
        .unwrap();

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["email"], "orders@sharma.in");
        assert_eq!(json["name"], "Sharma Stores");
        assert!(json["createdAt"].is_string());

        let back: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(back, customer);
    }

    #[test]
    fn invalid_email_is_rejected() {
        let result = Customer::create(
            CustomerId::new(),
            NewCustomer {
                name: "X".into(),
                email: "not-an-email".into(),
                phone: "9123456780".into(),
                address: "Y".into(),
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
