//! Authentication HTTP API.
pub mod login;
pub mod me;
pub mod register;

use serde::{Deserialize, Serialize};

use crate::user::{Session, UserResource};

pub const TOKEN_TYPE: &str = "Bearer";

/// Issued token with its owner.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub user: UserResource,
}

impl From<Session> for Response {
    fn from(session: Session) -> Self {
        Self {
            token_type: TOKEN_TYPE.to_owned(),
            token: session.token,
            expires_in: session.expires_in,
            user: session.user.into(),
        }
    }
}
