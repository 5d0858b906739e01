mod builder;
mod memory;
mod repository;
pub(crate) mod service;

pub use builder::*;
pub use memory::*;
pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};

/// Identifier of a [`User`].
pub type UserId = i64;

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub is_activated: bool,
    pub is_superadmin: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// User waiting to be inserted. Password is already hashed.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub is_activated: bool,
    pub is_superadmin: bool,
}

/// Public representation of a [`User`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserResource {
    pub id: UserId,
    pub avatar: Option<String>,
    pub name: String,
}

impl From<&User> for UserResource {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            avatar: user.avatar.clone(),
            name: user.name.clone(),
        }
    }
}

impl From<User> for UserResource {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            avatar: user.avatar,
            name: user.name,
        }
    }
}

/// Lowercase and trim an email before storage or lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn email_taken() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "email",
        ValidationError::new("unique")
            .with_message("The email has already been taken.".into()),
    );
    errors
}

/// Check that `actor` owns the resource addressed by `target`.
///
/// `target` is the raw path segment; anything that is not the actor's own id
/// is refused.
pub fn ensure_owner(actor: &User, target: &str) -> Result<()> {
    match target.parse::<UserId>() {
        Ok(id) if id == actor.id => Ok(()),
        _ => {
            tracing::warn!(
                actor = actor.id,
                %target,
                "refused update of another user"
            );
            Err(ServerError::Unauthorized)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId) -> User {
        User {
            id,
            name: "Test".into(),
            email: "test@email.com".into(),
            password: String::default(),
            avatar: None,
            is_activated: true,
            is_superadmin: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_ensure_owner() {
        let actor = user(1);

        assert!(ensure_owner(&actor, "1").is_ok());
        assert!(matches!(
            ensure_owner(&actor, "3"),
            Err(ServerError::Unauthorized)
        ));
        assert!(matches!(
            ensure_owner(&actor, "me"),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn test_resource_hides_secrets() {
        let mut actor = user(7);
        actor.password = "$argon2id$secret".into();

        let json = serde_json::to_value(UserResource::from(&actor)).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert!(object.contains_key("avatar"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("email"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Test@Email.COM "), "test@email.com");
    }
}
