//! Error handler for accounts.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("the given data was invalid")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Form(#[from] FormRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("token cannot be signed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("missing or invalid 'Authorization' header")]
    Unauthenticated,

    #[error("acting user does not own this resource")]
    Unauthorized,

    #[error("user not found")]
    NotFound,
}

impl ServerError {
    pub fn internal(details: impl Into<String>) -> Self {
        Self::Internal {
            details: details.into(),
            source: None,
        }
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseError {
    pub error: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ResponseError {
    /// Create a new [`ResponseError`].
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: status.as_u16(),
            errors: None,
        }
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

fn parse_validation_errors(
    errors: &ValidationErrors,
) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, issues)| {
            (
                field.to_string(),
                issues.iter().map(|issue| issue.to_string()).collect(),
            )
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = match &self {
            ServerError::Validation(errors) => ResponseError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The given data was invalid.",
            )
            .errors(errors),

            ServerError::Json(rejection) => {
                ResponseError::new(rejection.status(), rejection.body_text())
            },

            ServerError::Form(rejection) => {
                ResponseError::new(rejection.status(), rejection.body_text())
            },

            ServerError::Unauthenticated => {
                ResponseError::new(StatusCode::UNAUTHORIZED, "Unauthenticated.")
            },

            ServerError::Unauthorized => ResponseError::new(
                StatusCode::UNAUTHORIZED,
                "You are not allowed to modify this user.",
            ),

            ServerError::NotFound => {
                ResponseError::new(StatusCode::NOT_FOUND, "User not found.")
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");
                ResponseError::default()
            },

            ServerError::Sql(_)
            | ServerError::Crypto(_)
            | ServerError::Token(_) => {
                tracing::error!(error = %self, "server returned 500 status");
                ResponseError::default()
            },
        };

        response.into_response()
    }
}
