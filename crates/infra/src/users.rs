//! Staff accounts: sign-in and admin-managed CRUD.

use std::sync::Arc;

use chrono::Utc;

use wholesale_auth::{NewUser, Role, User, UserPatch};
use wholesale_core::{DomainError, Entity, UserId};

use crate::error::ServiceResult;
use crate::query::{Page, PageRequest, paginate};
use crate::store::{DocumentStore, Transaction, require};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug)]
pub struct UserDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for UserDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

async fn admin_count<T: Transaction>(tx: &mut T) -> ServiceResult<usize> {
    Ok(tx.find_by::<User>("role", Role::Admin.as_str()).await?.len())
}

impl<S: DocumentStore> UserDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip_all, fields(role = %input.role))]
    pub async fn create(&self, input: NewUser) -> ServiceResult<User> {
        let user = User::create(UserId::new(), input, Utc::now())?;

        let mut tx = self.store.begin().await?;
        tx.insert(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id(), "user created");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let user = require::<User, _>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Newest first.
    pub async fn list(&self, query: UserQuery) -> ServiceResult<Page<User>> {
        query.page.validate()?;

        let mut tx = self.store.begin().await?;
        let users = tx.list::<User>().await?;
        tx.commit().await?;

        let needle = query.search.as_deref().map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let mut users: Vec<User> = users
            .into_iter()
            .filter(|u| query.role.is_none_or(|r| u.role() == r))
            .filter(|u| needle.is_empty() || u.name().to_lowercase().contains(&needle) || u.email().contains(&needle))
            .collect();
        users.sort_by(|a, b| (b.created_at(), b.id()).cmp(&(a.created_at(), a.id())));

        Ok(paginate(users, query.page)?)
    }

    /// Refuses to demote the last admin.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: UserId, patch: UserPatch) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let mut user = require::<User, _>(&mut tx, id).await?;
        let demoting = user.is_admin() && patch.role.is_some_and(|r| r != Role::Admin);
        if demoting && admin_count(&mut tx).await? <= 1 {
            return Err(DomainError::invalid_state("cannot demote the last admin account").into());
        }
        user.apply_patch(patch, Utc::now())?;
        tx.update(&user).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Refuses self-deletion and removing the last admin.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: UserId, acting: UserId) -> ServiceResult<()> {
        if id == acting {
            return Err(DomainError::invalid_state("cannot delete your own account").into());
        }

        let mut tx = self.store.begin().await?;
        let user = require::<User, _>(&mut tx, id).await?;
        if user.is_admin() && admin_count(&mut tx).await? <= 1 {
            return Err(DomainError::invalid_state("cannot delete the last admin account").into());
        }
        tx.delete::<User>(id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim().to_lowercase();

        let mut tx = self.store.begin().await?;
        let found = tx.find_by::<User>("email", &email).await?;
        tx.commit().await?;

        match found.into_iter().next() {
            Some(user) if user.verify_password(password) => Ok(user),
            _ => {
                tracing::debug!("sign-in rejected");
                Err(DomainError::Unauthorized.into())
            }
        }
    }

    /// Create `seed` as the first admin when no admin account exists yet.
    pub async fn ensure_admin(&self, seed: NewUser) -> ServiceResult<Option<User>> {
        let mut tx = self.store.begin().await?;
        let admins = admin_count(&mut tx).await?;
        tx.commit().await?;
        if admins > 0 {
            return Ok(None);
        }

        let seed = NewUser { role: Role::Admin, ..seed };
        let user = self.create(seed).await?;
        tracing::info!(email = user.email(), "bootstrap admin account created");
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn directory() -> UserDirectory<InMemoryStore> {
        UserDirectory::new(Arc::new(InMemoryStore::new()))
    }

    fn new_user(name: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password: "secret1".into(),
            role,
        }
    }

    #[tokio::test]
    async fn sign_in_checks_email_and_password() {
        let users = directory();
        let asha = users.create(new_user("Asha", "asha@example.com", Role::Clerk)).await.unwrap();

        let signed_in = users.authenticate(" ASHA@example.com ", "secret1").await.unwrap();
        assert_eq!(signed_in.id(), asha.id());

        for (email, password) in [("asha@example.com", "wrong!"), ("nobody@example.com", "secret1")] {
            let err = users.authenticate(email, password).await.unwrap_err();
            assert_eq!(err.domain(), Some(&DomainError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn email_is_unique_ignoring_case() {
        let users = directory();
        users.create(new_user("Asha", "asha@example.com", Role::Clerk)).await.unwrap();
        let err = users.create(new_user("Other", "Asha@Example.com", Role::Manager)).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("duplicate_key"));
    }

    #[tokio::test]
    async fn last_admin_is_protected() {
        let users = directory();
        let root = users.create(new_user("Root", "root@example.com", Role::Admin)).await.unwrap();
        let clerk = users.create(new_user("Ravi", "ravi@example.com", Role::Clerk)).await.unwrap();

        let err = users.delete(root.id(), clerk.id()).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("invalid_state"));

        let demote = UserPatch {
            role: Some(Role::Manager),
            ..UserPatch::default()
        };
        let err = users.update(root.id(), demote.clone()).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("invalid_state"));

        let err = users.delete(root.id(), root.id()).await.unwrap_err();
        assert_eq!(err.domain().map(DomainError::code), Some("invalid_state"));

        // With a second admin both operations go through.
        let second = users.create(new_user("Meera", "meera@example.com", Role::Admin)).await.unwrap();
        users.update(root.id(), demote).await.unwrap();
        users.delete(root.id(), second.id()).await.unwrap();
        users.delete(clerk.id(), second.id()).await.unwrap();
        assert!(users.get(clerk.id()).await.is_err());
    }

    #[tokio::test]
    async fn list_filters_by_role_and_search() {
        let users = directory();
        users.create(new_user("Asha", "asha@example.com", Role::Clerk)).await.unwrap();
        users.create(new_user("Ravi", "ravi@shop.in", Role::Clerk)).await.unwrap();
        users.create(new_user("Meera", "meera@example.com", Role::Manager)).await.unwrap();

        let clerks = users
            .list(UserQuery {
                role: Some(Role::Clerk),
                ..UserQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(clerks.total, 2);

        let found = users
            .list(UserQuery {
                search: Some("SHOP".into()),
                ..UserQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(found.items.iter().map(User::name).collect::<Vec<_>>(), vec!["Ravi"]);
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let users = directory();
        let seed = new_user("Owner", "owner@example.com", Role::Clerk);

        let created = users.ensure_admin(seed.clone()).await.unwrap().unwrap();
        assert_eq!(created.role(), Role::Admin);
        assert!(users.ensure_admin(seed).await.unwrap().is_none());
    }
}
