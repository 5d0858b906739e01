//! Get a user by id.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::Result;
use crate::router::Data;
use crate::user::UserResource;

pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Data<UserResource>>> {
    let user = state.accounts.find(&user_id).await?;

    Ok(Json(Data::new(user.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, state};
    use crate::*;

    #[tokio::test]
    async fn test_get_user_handler() {
        let app = app(state().await);

        let response =
            make_request(None, app, Method::GET, "/api/users/1", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["name"], "Test");
        assert!(body["data"]["avatar"].is_null());
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let app = app(state().await);

        for path in ["/api/users/3515295123952512", "/api/users/someone"] {
            let response =
                make_request(None, app.clone(), Method::GET, path, String::default())
                    .await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(json(response).await["error"].is_string());
        }
    }
}
