//! Authentication and ownership guards for routes.

use axum::extract::{FromRequestParts, Path};
use axum::http::header;
use axum::http::request::Parts;

use crate::AppState;
use crate::error::ServerError;
use crate::user::{User, ensure_owner};

const BEARER: &str = "Bearer";

/// Token of an `Authorization` value. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}

/// User behind the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(AuthUser(user.clone()));
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ServerError::Unauthenticated)?;

        let user = state.accounts.authenticate(token).await?;
        parts.extensions.insert(user.clone());

        Ok(AuthUser(user))
    }
}

/// Authenticated user who owns the `{user_id}` of the route.
///
/// Must be extracted before the body so that a foreign user is refused
/// whatever it sent.
#[derive(Debug, Clone)]
pub struct Owner(pub User);

impl FromRequestParts<AppState> for Owner {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(actor) = AuthUser::from_request_parts(parts, state).await?;
        let Path(target) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ServerError::NotFound)?;

        ensure_owner(&actor, &target)?;
        Ok(Owner(actor))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::app;
    use crate::router::tests::{login, state};

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_lowercase_scheme() {
        let state = state().await;
        let token = login(&state, "test@email.com").await;

        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
