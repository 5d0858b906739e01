//! Typed builder for User.

use crate::crypto::PasswordManager;
use crate::error::Result;
use crate::user::{NewUser, normalize_email};

/// [`NewUser`] builder.
///
/// Only buildable once both `email` and `password` are set.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email, Password> {
    name: String,
    email: Email,
    password: Password,
    is_activated: bool,
    is_superadmin: bool,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            name: String::default(),
            email: Missing,
            password: Missing,
            is_activated: true,
            is_superadmin: false,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Password> UserBuilder<Missing, Password> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl AsRef<str>,
    ) -> UserBuilder<Present<String>, Password> {
        UserBuilder {
            name: self.name,
            email: Present(normalize_email(email.as_ref())),
            password: self.password,
            is_activated: self.is_activated,
            is_superadmin: self.is_superadmin,
        }
    }
}

impl<Email> UserBuilder<Email, Missing> {
    /// Update `password` field on [`UserBuilder`]. Plaintext, hashed on
    /// build.
    pub fn password(
        self,
        password: impl ToString,
    ) -> UserBuilder<Email, Present<String>> {
        UserBuilder {
            name: self.name,
            email: self.email,
            password: Present(password.to_string()),
            is_activated: self.is_activated,
            is_superadmin: self.is_superadmin,
        }
    }
}

impl<Email, Password> UserBuilder<Email, Password> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `is_activated` field on [`UserBuilder`].
    pub fn activated(mut self, activated: bool) -> Self {
        self.is_activated = activated;
        self
    }

    /// Update `is_superadmin` field on [`UserBuilder`]. No route grants it.
    #[cfg(test)]
    pub fn superadmin(mut self, superadmin: bool) -> Self {
        self.is_superadmin = superadmin;
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Hash the password and build a [`NewUser`].
    pub fn build(self, pwd: &PasswordManager) -> Result<NewUser> {
        Ok(NewUser {
            name: self.name,
            email: self.email.0,
            password: pwd.hash_password(&self.password.0)?,
            avatar: None,
            is_activated: self.is_activated,
            is_superadmin: self.is_superadmin,
        })
    }
}
