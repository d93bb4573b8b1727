use serde::Serialize;

use wholesale_core::UserId;

use crate::{Permission, Role};

/// An authenticated user, as seen by authorization and audit fields
/// (`createdBy`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        self.role.permissions()
    }
}
