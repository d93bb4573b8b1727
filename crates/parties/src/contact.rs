//! Contact details shared by customers and suppliers.

use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult};

/// Structural email check: `local@domain.tld`, no whitespace, a TLD of at
/// least two characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty()
                && !host.starts_with('.')
                && !host.ends_with('.')
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

fn name(value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation("name", "name cannot be empty"));
    }
    Ok(value.to_string())
}

fn email(value: &str) -> DomainResult<String> {
    let value = value.trim().to_lowercase();
    if !is_valid_email(&value) {
        return Err(DomainError::validation("email", "please provide a valid email"));
    }
    Ok(value)
}

fn phone(value: &str) -> DomainResult<String> {
    let value = value.trim();
    if !is_valid_phone(value) {
        return Err(DomainError::validation("phone", "phone number must be 10 digits"));
    }
    Ok(value.to_string())
}

fn address(value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation("address", "address cannot be empty"));
    }
    Ok(value.to_string())
}

/// Validated name, email, phone and address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    name: String,
    email: String,
    phone: String,
    address: String,
}

/// Partial update of contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactInfo {
    pub fn new(raw_name: &str, raw_email: &str, raw_phone: &str, raw_address: &str) -> DomainResult<Self> {
        Ok(Self {
            name: name(raw_name)?,
            email: email(raw_email)?,
            phone: phone(raw_phone)?,
            address: address(raw_address)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Case-insensitive match on name, email or phone.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.email.contains(&needle)
            || self.phone.contains(&needle)
    }

    /// Validate every supplied field, then write them all.
    pub fn apply(&mut self, patch: ContactPatch) -> DomainResult<()> {
        let next = Self {
            name: patch.name.as_deref().map(name).transpose()?.unwrap_or_else(|| self.name.clone()),
            email: patch.email.as_deref().map(email).transpose()?.unwrap_or_else(|| self.email.clone()),
            phone: patch.phone.as_deref().map(phone).transpose()?.unwrap_or_else(|| self.phone.clone()),
            address: patch
                .address
                .as_deref()
                .map(address)
                .transpose()?
                .unwrap_or_else(|| self.address.clone()),
        };
        *self = next;
        Ok(())
    }
}
