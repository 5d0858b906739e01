//! Create an account.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::auth::Response;
use crate::router::{Valid, lenient_string};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The name field is required."),
        length(
            min = 1,
            max = 255,
            message = "The name must be 1 to 255 characters long."
        )
    )]
    name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "The password field is required."),
        length(
            min = 6,
            max = 255,
            message = "The password must be 6 to 255 characters long."
        )
    )]
    password: Option<String>,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let session = state
        .accounts
        .register(
            body.name.as_deref().unwrap_or_default(),
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::json;

    use super::*;
    use crate::router::tests::{json, state};
    use crate::*;

    #[tokio::test]
    async fn test_register_handler() {
        let state = state().await;
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/auth/register",
            json!({
                "name": "Newcomer",
                "email": "newcomer@email.com",
                "password": "secret123",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Response = serde_json::from_value(json(response).await).unwrap();
        assert_eq!(body.user.id, 4);
        assert_eq!(body.user.name, "Newcomer");
        assert!(state.accounts.login("newcomer@email.com", "secret123").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_taken_email() {
        let app = app(state().await);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/auth/register",
            json!({
                "name": "Copycat",
                "email": "admin@email.com",
                "password": "secret123",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(response).await["errors"]["email"].is_array());
    }
}
