//! Staff accounts that can sign in.
//!
//! The password is only ever held as an argon2 hash. [`UserProfile`] is the
//! shape handed out over the API; it never carries the hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult, Entity, UserId};
use wholesale_parties::is_valid_email;

use crate::password::{MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::{Principal, Role};

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl core::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserPatch")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Public view of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

fn password(value: &str) -> DomainResult<String> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    hash_password(value).map_err(|e| DomainError::validation("password", e.to_string()))
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

impl User {
    pub fn create(id: UserId, input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: name(&input.name)?,
            email: email(&input.email)?,
            role: input.role,
            password_hash: password(&input.password)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        verify_password(candidate, &self.password_hash)
    }

    /// Validate every supplied field, then write them all. A new password is
    /// re-hashed.
    pub fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let new_name = patch.name.as_deref().map(name).transpose()?;
        let new_email = patch.email.as_deref().map(email).transpose()?;
        let new_hash = patch.password.as_deref().map(password).transpose()?;

        if let Some(v) = new_name {
            self.name = v;
        }
        if let Some(v) = new_email {
            self.email = v;
        }
        if let Some(v) = new_hash {
            self.password_hash = v;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.name.clone(), self.role)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
