//! In-memory user store, used without database and by tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::user::{NewUser, User, UserId, UserRepository, email_taken};

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    last_id: UserId,
}

/// [`UserRepository`] kept in process memory.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

impl MemoryUserRepository {
    /// Create an empty [`MemoryUserRepository`].
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(email_taken().into());
        }

        inner.last_id += 1;
        let now = chrono::Utc::now();
        let user = User {
            id: inner.last_id,
            name: user.name,
            email: user.email,
            password: user.password,
            avatar: user.avatar,
            is_activated: user.is_activated,
            is_superadmin: user.is_superadmin,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64)> {
        let inner = self.inner.read().await;
        let users = inner
            .users
            .values()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((users, inner.users.len() as u64))
    }

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;

        Ok(inner.users.get_mut(&id).map(|user| {
            user.name = name.to_owned();
            if let Some(avatar) = avatar {
                user.avatar = Some(avatar.to_owned());
            }
            user.updated_at = chrono::Utc::now();
            user.clone()
        }))
    }

    async fn update_password(
        &self,
        id: UserId,
        hash: &str,
    ) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;

        Ok(inner.users.get_mut(&id).map(|user| {
            user.password = hash.to_owned();
            user.updated_at = chrono::Utc::now();
            user.clone()
        }))
    }

    async fn update_email(
        &self,
        id: UserId,
        email: &str,
    ) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.id != id && u.email == email) {
            return Err(email_taken().into());
        }

        Ok(inner.users.get_mut(&id).map(|user| {
            user.email = email.to_owned();
            user.updated_at = chrono::Utc::now();
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password: "hash".into(),
            avatar: None,
            is_activated: true,
            is_superadmin: false,
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let repo = MemoryUserRepository::new();

        let first = repo.insert(new_user("a@email.com")).await.unwrap();
        let second = repo.insert(new_user("b@email.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(
            repo.find_by_email("b@email.com").await.unwrap(),
            Some(second)
        );
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let repo = MemoryUserRepository::new();
        repo.insert(new_user("a@email.com")).await.unwrap();
        let other = repo.insert(new_user("b@email.com")).await.unwrap();

        assert!(repo.insert(new_user("a@email.com")).await.is_err());
        assert!(repo.update_email(other.id, "a@email.com").await.is_err());
        assert_eq!(
            repo.find_by_id(other.id).await.unwrap().unwrap().email,
            "b@email.com"
        );
    }

    #[tokio::test]
    async fn test_list_window() {
        let repo = MemoryUserRepository::new();
        for i in 0..5 {
            repo.insert(new_user(&format!("{i}@email.com"))).await.unwrap();
        }

        let (users, total) = repo.list(2, 2).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), [3, 4]);
    }

    #[tokio::test]
    async fn test_narrow_updates() {
        let repo = MemoryUserRepository::new();
        let user = repo.insert(new_user("a@email.com")).await.unwrap();

        repo.update_password(user.id, "new-hash").await.unwrap();
        let updated = repo
            .update_profile(user.id, "Renamed", None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.password, "new-hash");
        assert_eq!(updated.email, "a@email.com");
        assert!(repo.update_password(42, "hash").await.unwrap().is_none());
    }
}
