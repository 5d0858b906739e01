//! Account operations shared by every route.

use std::sync::Arc;

use validator::{ValidationError, ValidationErrors};

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::token::TokenManager;
use crate::user::{
    User, UserBuilder, UserId, UserRepository, email_taken, normalize_email,
};

pub const MAX_PER_PAGE: u64 = 100;

/// One page of users.
#[derive(Debug)]
pub struct Page {
    pub users: Vec<User>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    /// Last page number, `1` for an empty store.
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Position of the first user of this page, starting at 1.
    pub fn from(&self) -> Option<u64> {
        (!self.users.is_empty()).then(|| (self.page - 1) * self.per_page + 1)
    }

    /// Position of the last user of this page.
    pub fn to(&self) -> Option<u64> {
        self.from().map(|from| from + self.users.len() as u64 - 1)
    }
}

/// Issued credentials.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Account manager.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    pwd: Arc<PasswordManager>,
    token: TokenManager,
    activation_required: bool,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        repo: Arc<dyn UserRepository>,
        pwd: Arc<PasswordManager>,
        token: TokenManager,
    ) -> Self {
        Self {
            repo,
            pwd,
            token,
            activation_required: false,
        }
    }

    /// Require activation before newly registered users can log in.
    pub fn activation_required(mut self, required: bool) -> Self {
        self.activation_required = required;
        self
    }

    fn session(&self, user: User) -> Result<Session> {
        Ok(Session {
            token: self.token.create(&user.id.to_string())?,
            expires_in: self.token.expiration(),
            user,
        })
    }

    /// Exchange credentials for a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let Some(user) =
            self.repo.find_by_email(&normalize_email(email)).await?
        else {
            return Err(ServerError::Unauthenticated);
        };

        if self.pwd.verify_password(password, &user.password).is_err() {
            tracing::info!(user_id = user.id, "login with wrong password");
            return Err(ServerError::Unauthenticated);
        }

        if !user.is_activated {
            tracing::info!(user_id = user.id, "login of inactive account");
            return Err(ServerError::Unauthenticated);
        }

        self.session(user)
    }

    /// Create an account and log it in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let new_user = UserBuilder::new()
            .name(name)
            .email(email)
            .password(password)
            .activated(!self.activation_required)
            .build(&self.pwd)?;

        if self.repo.find_by_email(&new_user.email).await?.is_some() {
            return Err(email_taken().into());
        }

        let user = self.repo.insert(new_user).await?;
        tracing::info!(user_id = user.id, "user created");

        self.session(user)
    }

    /// Resolve the user behind a bearer token.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.token.decode(token)?;
        let id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ServerError::Unauthenticated)?;

        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ServerError::Unauthenticated)
    }

    /// Find a user using its raw id.
    pub async fn find(&self, id: &str) -> Result<User> {
        let id = id.parse::<UserId>().map_err(|_| ServerError::NotFound)?;

        self.repo.find_by_id(id).await?.ok_or(ServerError::NotFound)
    }

    /// Paginate users. Out-of-range values are clamped.
    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);

        let (users, total) = self.repo.list(offset, per_page).await?;

        Ok(Page {
            users,
            total,
            page,
            per_page,
        })
    }

    /// Update `name` of `user`, and `avatar` when given.
    ///
    /// Only these columns are written, so concurrent password or email
    /// changes are kept.
    pub async fn update_profile(
        &self,
        user: &User,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<User> {
        self.repo
            .update_profile(user.id, name, avatar)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Replace the password of `user` after checking the current one.
    pub async fn update_password(
        &self,
        user: &User,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<User> {
        // Check against the stored hash, not the one read with the request.
        let stored = self
            .repo
            .find_by_id(user.id)
            .await?
            .ok_or(ServerError::NotFound)?;
        let mut errors = ValidationErrors::new();

        if new_password != confirmation {
            errors.add(
                "new_password",
                ValidationError::new("confirmed").with_message(
                    "The new password confirmation does not match.".into(),
                ),
            );
        }

        if self.pwd.verify_password(current, &stored.password).is_err() {
            errors.add(
                "password",
                ValidationError::new("invalid_password")
                    .with_message("The current password is incorrect.".into()),
            );
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let hash = self.pwd.hash_password(new_password)?;
        let user = self
            .repo
            .update_password(user.id, &hash)
            .await?
            .ok_or(ServerError::NotFound)?;
        tracing::info!(user_id = user.id, "password updated");

        Ok(user)
    }

    /// Replace the email of `user`.
    ///
    /// Any email already stored is refused, the user's own included.
    pub async fn update_account(&self, user: &User, email: &str) -> Result<User> {
        let email = normalize_email(email);

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(email_taken().into());
        }

        let user = self
            .repo
            .update_email(user.id, &email)
            .await?
            .ok_or(ServerError::NotFound)?;
        tracing::info!(user_id = user.id, "email updated");

        Ok(user)
    }
}
