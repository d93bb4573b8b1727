//! API-side authorization guard.
//!
//! Handlers check permissions before calling into a service, which keeps the
//! services themselves auth-agnostic.

use wholesale_auth::{AuthzError, CommandAuthorization, Permission, authorize_all};

use crate::context::PrincipalContext;

struct Required<'a>(&'a [Permission]);

impl CommandAuthorization for Required<'_> {
    fn required_permissions(&self) -> &[Permission] {
        self.0
    }
}

/// Fail unless the caller's role grants every permission in `required`.
pub fn require(principal: &PrincipalContext, required: &[Permission]) -> Result<(), AuthzError> {
    authorize_all(principal.principal(), &Required(required))
}

#[cfg(test)]
mod tests {
    use wholesale_auth::{Principal, Role};
    use wholesale_core::UserId;

    use super::*;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal::new(UserId::new(), "Tester", role))
    }

    #[test]
    fn clerk_reads_but_cannot_see_sales() {
        assert!(require(&ctx(Role::Clerk), &[Permission::REPORTS_READ]).is_ok());
        assert!(require(&ctx(Role::Clerk), &[Permission::REPORTS_SALES]).is_err());
        assert!(require(&ctx(Role::Manager), &[Permission::REPORTS_SALES]).is_ok());
    }

    #[test]
    fn empty_requirement_always_passes() {
        assert!(require(&ctx(Role::Clerk), &[]).is_ok());
    }
}
