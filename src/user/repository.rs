//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::{NewUser, User, UserId, email_taken};

const USER_COLUMNS: &str = "id, name, email, password, avatar, is_activated, \
                            is_superadmin, created_at, updated_at";

/// Port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a [`NewUser`] and return the stored [`User`].
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Users ordered by id, with the total count of users.
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64)>;
    /// Set `name`, and `avatar` when given. `None` if the user is gone.
    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Option<User>>;
    /// Set the password hash only.
    async fn update_password(
        &self,
        id: UserId,
        hash: &str,
    ) -> Result<Option<User>>;
    /// Set the email only. `email` must already be normalized.
    async fn update_email(&self, id: UserId, email: &str)
    -> Result<Option<User>>;
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Convert a window to Postgres `LIMIT`/`OFFSET`, which are signed.
fn sql_window(offset: u64, limit: u64) -> (i64, i64) {
    (
        i64::try_from(offset).unwrap_or(i64::MAX),
        i64::try_from(limit).unwrap_or(i64::MAX),
    )
}

/// Email uniqueness is also enforced by `users_email_key`.
fn unique_email(err: sqlx::Error) -> ServerError {
    if err
        .as_database_error()
        .is_some_and(|err| err.is_unique_violation())
    {
        email_taken().into()
    } else {
        err.into()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            r#"INSERT INTO users (name, email, password, avatar, is_activated, is_superadmin)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {USER_COLUMNS}"#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.avatar)
            .bind(user.is_activated)
            .bind(user.is_superadmin)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_email)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64)> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        );

        let (offset, limit) = sql_window(offset, limit);
        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total.max(0) as u64))
    }

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Option<User>> {
        let query = format!(
            r#"UPDATE users
                SET name = $1, avatar = COALESCE($2, avatar), updated_at = NOW()
                WHERE id = $3
                RETURNING {USER_COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(avatar)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_password(
        &self,
        id: UserId,
        hash: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            r#"UPDATE users SET password = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING {USER_COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_email(
        &self,
        id: UserId,
        email: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            r#"UPDATE users SET email = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING {USER_COLUMNS}"#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unique_email)
    }
}
