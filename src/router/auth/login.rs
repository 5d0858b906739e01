//! Exchange credentials for a token.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::auth::Response;
use crate::router::{Valid, lenient_string};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(required(message = "The password field is required."))]
    password: Option<String>,
}

/// Handler to log in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let session = state
        .accounts
        .login(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(session.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::router::tests::{json, state};
    use crate::*;

    #[tokio::test]
    async fn test_login_handler() {
        let state = state().await;
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/auth/login",
            json!({ "email": "test@email.com", "password": 123456 }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Response = serde_json::from_value(json(response).await).unwrap();
        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.user.id, 1);
        assert_eq!(state.accounts.authenticate(&body.token).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = app(state().await);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/auth/login",
            json!({ "email": "test@email.com", "password": "nope" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_invalid_email() {
        let app = app(state().await);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/auth/login",
            json!({ "email": "test", "password": "123456" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(response).await["errors"]["email"].is_array());
    }
}
