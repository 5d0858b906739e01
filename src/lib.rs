//! Accounts is a lightweight user account management API.
#![forbid(unsafe_code)]

mod crypto;
mod database;
pub mod error;
mod middleware;
mod router;
pub mod telemetry;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    send(token, app, method, path, "application/json", body).await
}

/// Same as [`make_request`] with an urlencoded form body.
#[cfg(test)]
pub async fn make_form_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: &str,
) -> axum::http::Response<axum::body::Body> {
    send(
        token,
        app,
        method,
        path,
        "application/x-www-form-urlencoded",
        body.to_owned(),
    )
    .await
}

#[cfg(test)]
async fn send(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    content_type: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use tower::util::ServiceExt;

    let mut request = axum::http::Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub accounts: user::AccountService,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let api = Router::new()
        // `POST /api/auth/login` goes to `login`.
        .route("/auth/login", post(router::auth::login::handler))
        .route("/auth/register", post(router::auth::register::handler))
        // `GET /api/auth/me`. Authorization required.
        .route("/auth/me", get(router::auth::me::handler))
        .route("/users", get(router::users::list::handler))
        // `PUT /api/users/{user_id}` and sub-resources. Ownership required.
        .route(
            "/users/{user_id}",
            get(router::users::get::handler).put(router::users::profile::handler),
        )
        .route("/users/{user_id}/password", put(router::users::password::handler))
        .route("/users/{user_id}/account", put(router::users::account::handler));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/api", api)
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let path = std::env::var("CONFIG_PATH").unwrap_or_default();
    let config = config::Configuration::default().path(path.into()).read()?;

    let repo: Arc<dyn user::UserRepository> = match config.postgres {
        Some(ref postgres) => {
            Arc::new(user::PgUserRepository::new(database::connect(postgres).await?))
        },
        None => {
            tracing::warn!("missing `postgres` entry on `config.yaml` file, users are kept in memory");
            Arc::new(user::MemoryUserRepository::new())
        },
    };

    let pwd = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    // handle jwt.
    let Some(token) = &config.token else {
        tracing::error!("missing `token` entry on `config.yaml` file");
        return Err("missing `token` configuration".into());
    };
    let issuer = if config.url.is_empty() { config.name.as_str() } else { config.url.as_str() };
    let token = token::TokenManager::new(issuer, token)?;

    let accounts = user::AccountService::new(repo, pwd, token)
        .activation_required(config.activation_required);

    Ok(AppState { config, accounts })
}
