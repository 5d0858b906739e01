//! Update email of a user.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::middleware::Owner;
use crate::router::Valid;
use crate::user::UserResource;

const STATUS_OK: &str = "ok";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    email: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    pub data: UserResource,
}

pub async fn handler(
    State(state): State<AppState>,
    Owner(user): Owner,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = state
        .accounts
        .update_account(&user, body.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(Response {
        status: STATUS_OK.to_owned(),
        data: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::router::tests::{json, login, state};
    use crate::*;

    #[tokio::test]
    async fn test_update_account_handler() {
        let state = state().await;
        let token = login(&state, "test@email.com").await;
        let app = app(state.clone());

        let response = make_request(
            Some(&token),
            app,
            Method::PUT,
            "/api/users/1/account",
            json!({ "email": "k3bq9x0mzp@gmail.com" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");

        let user = state.accounts.find("1").await.unwrap();
        assert_eq!(user.email, "k3bq9x0mzp@gmail.com");
    }

    #[tokio::test]
    async fn test_update_account_with_same_email() {
        let state = state().await;
        let token = login(&state, "test@email.com").await;
        let app = app(state);

        let response = make_request(
            Some(&token),
            app,
            Method::PUT,
            "/api/users/1/account",
            json!({ "email": "test@email.com" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(response).await["errors"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_update_account_invalid_email() {
        let state = state().await;
        let token = login(&state, "test@email.com").await;
        let app = app(state);

        for body in [json!({ "email": "not-an-email" }), json!({})] {
            let response = make_request(
                Some(&token),
                app.clone(),
                Method::PUT,
                "/api/users/1/account",
                body.to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn test_update_account_of_another_user() {
        let state = state().await;
        let token = login(&state, "test2@email.com").await;
        let app = app(state.clone());

        let response = make_request(
            Some(&token),
            app,
            Method::PUT,
            "/api/users/1/account",
            json!({ "email": "fresh@gmail.com" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.accounts.find("1").await.unwrap().email, "test@email.com");
    }
}
