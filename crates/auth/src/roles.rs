use core::str::FromStr;

use serde::{Deserialize, Serialize};

use wholesale_core::DomainError;

use crate::Permission;

/// Role carried by a user's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Clerk,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Clerk => "clerk",
        }
    }

    /// Permissions granted by this role.
    ///
    /// Clerks can take orders and sign up new customers. Managers get
    /// everything clerks get plus catalog/party writes, order updates and
    /// sales reports. Admins hold the wildcard, which includes user management.
    pub fn permissions(&self) -> Vec<Permission> {
        let clerk = [
            Permission::PRODUCTS_READ,
            Permission::BATCHES_READ,
            Permission::PARTIES_READ,
            Permission::CUSTOMERS_CREATE,
            Permission::ORDERS_READ,
            Permission::ORDERS_CREATE,
            Permission::REPORTS_READ,
        ];

        match self {
            Role::Admin => vec![Permission::ALL],
            Role::Clerk => clerk.to_vec(),
            Role::Manager => {
                let mut perms = clerk.to_vec();
                perms.extend([
                    Permission::PRODUCTS_WRITE,
                    Permission::BATCHES_WRITE,
                    Permission::PARTIES_WRITE,
                    Permission::ORDERS_UPDATE,
                    Permission::REPORTS_SALES,
                ]);
                perms
            }
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "clerk" => Ok(Role::Clerk),
            other => Err(DomainError::validation("role", format!("unknown role '{other}'"))),
        }
    }
}
