use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{DomainResult, Entity, SupplierId};

use crate::contact::{ContactInfo, ContactPatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub gst_no: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    #[serde(flatten)]
    pub contact: ContactPatch,
    pub gst_no: Option<String>,
}

/// Blank tax ids are stored as absent.
fn normalize_gst(raw: Option<&str>) -> Option<String> {
    raw.map(|g| g.trim().to_uppercase()).filter(|g| !g.is_empty())
}

/// A vendor that products are sourced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    id: SupplierId,
    #[serde(flatten)]
    contact: ContactInfo,
    gst_no: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}

impl Supplier {
    pub fn create(id: SupplierId, input: NewSupplier, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            contact: ContactInfo::new(&input.name, &input.email, &input.phone, &input.address)?,
            gst_no: normalize_gst(input.gst_no.as_deref()),
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

    pub fn gst_no(&self) -> Option<&str> {
        self.gst_no.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn apply_patch(&mut self, patch: SupplierPatch, now: DateTime<Utc>) -> DomainResult<()> {
        self.contact.apply(patch.contact)?;
        if patch.gst_no.is_some() {
            self.gst_no = normalize_gst(patch.gst_no.as_deref());
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier(gst: Option<&str>) -> Supplier {
        Supplier::create(
            SupplierId::new(),
            NewSupplier {
                name: "Agro Mills".into(),
                email: "contact@agromills.in".into(),
                phone: "9000000001".into(),
                address: "Plot 9, Industrial Area".into(),
                gst_no: gst.map(str::to_string),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn gst_is_upper_cased_and_blank_dropped() {
        assert_eq!(supplier(Some(" 27abcde1234f1z5 ")).gst_no(), Some("27ABCDE1234F1Z5"));
        assert_eq!(supplier(Some("  ")).gst_no(), None);
        assert_eq!(supplier(None).gst_no(), None);
    }

    #[test]
    fn patch_parses_flat_json() {
        let patch: SupplierPatch =
            serde_json::from_value(serde_json::json!({ "phone": "9000000002", "gstNo": "x1" })).unwrap();
        let mut s = supplier(None);
        s.apply_patch(patch, Utc::now()).unwrap();
        assert_eq!(s.contact().phone(), "9000000002");
        assert_eq!(s.gst_no(), Some("X1"));
    }
}
