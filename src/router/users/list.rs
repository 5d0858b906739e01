//! Paginated list of users.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;
use crate::error::Result;
use crate::user::{Page, UserResource};

const PATH: &str = "api/users";

/// Raw query. Values that do not parse fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    page: Option<String>,
    per_page: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Links {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub current_page: u64,
    pub from: Option<u64>,
    pub last_page: u64,
    pub path: String,
    pub per_page: u64,
    pub to: Option<u64>,
    pub total: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub data: Vec<UserResource>,
    pub links: Links,
    pub meta: Meta,
}

/// Build links against the configured instance URL, or relative links when
/// none is configured.
struct LinkBuilder {
    base: String,
    per_page: Option<u64>,
}

impl LinkBuilder {
    fn new(instance_url: &str, per_page: Option<u64>) -> Self {
        let base = Url::parse(instance_url)
            .and_then(|url| url.join(PATH))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("/{PATH}"));

        Self { base, per_page }
    }

    fn page(&self, page: u64) -> String {
        match self.per_page {
            Some(per_page) => {
                format!("{}?page={page}&per_page={per_page}", self.base)
            },
            None => format!("{}?page={page}", self.base),
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

pub async fn handler(
    State(state): State<AppState>,
    Query(query): Query<Pagination>,
) -> Result<Json<Response>> {
    let page = parse_positive(query.page.as_deref()).unwrap_or(1);
    let requested = parse_positive(query.per_page.as_deref());

    let result: Page = state
        .accounts
        .list(page, requested.unwrap_or(state.config.per_page))
        .await?;

    // Keep `per_page` in links only when the client chose it.
    let links = LinkBuilder::new(
        &state.config.url,
        requested.map(|_| result.per_page),
    );
    let last_page = result.last_page();

    Ok(Json(Response {
        links: Links {
            first: links.page(1),
            last: links.page(last_page),
            prev: (result.page > 1).then(|| links.page(result.page - 1)),
            next: (result.page < last_page).then(|| links.page(result.page + 1)),
        },
        meta: Meta {
            current_page: result.page,
            from: result.from(),
            last_page,
            path: links.base.clone(),
            per_page: result.per_page,
            to: result.to(),
            total: result.total,
        },
        data: result.users.into_iter().map(UserResource::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::router::tests::{json, state};
    use crate::*;

    async fn list(path: &str) -> Response {
        let app = app(state().await);

        let response =
            make_request(None, app, Method::GET, path, String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        serde_json::from_value(json(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_list_handler() {
        let body = list("/api/users").await;

        assert_eq!(body.data.len(), 3);
        assert_eq!(body.data[1].name, "Admin");
        assert_eq!(body.links.first, "http://localhost:8888/api/users?page=1");
        assert_eq!(body.links.last, "http://localhost:8888/api/users?page=1");
        assert_eq!(body.links.prev, None);
        assert_eq!(body.links.next, None);
        assert_eq!(body.meta.total, 3);
        assert_eq!(body.meta.from, Some(1));
        assert_eq!(body.meta.to, Some(3));
    }

    #[tokio::test]
    async fn test_list_second_page() {
        let body = list("/api/users?page=2&per_page=2").await;

        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].id, 3);
        assert_eq!(
            body.links.prev.as_deref(),
            Some("http://localhost:8888/api/users?page=1&per_page=2")
        );
        assert_eq!(body.links.next, None);
        assert_eq!(body.meta.last_page, 2);
    }

    #[tokio::test]
    async fn test_list_out_of_range() {
        let body = list("/api/users?page=40&per_page=abc").await;

        assert!(body.data.is_empty());
        assert_eq!(body.meta.current_page, 40);
        assert_eq!(body.meta.from, None);
        assert_eq!(body.links.last, "http://localhost:8888/api/users?page=1");
        assert_eq!(
            body.links.prev.as_deref(),
            Some("http://localhost:8888/api/users?page=39")
        );
    }

    #[test]
    fn test_relative_links() {
        let links = LinkBuilder::new("", None);
        assert_eq!(links.page(2), "/api/users?page=2");
    }

    #[tokio::test]
    async fn test_list_huge_page() {
        let body = list("/api/users?page=100000000000000000&per_page=15").await;

        assert!(body.data.is_empty());
        assert_eq!(body.meta.current_page, 100_000_000_000_000_000);
        assert_eq!(body.meta.total, 3);
        assert_eq!(body.links.next, None);
    }
}
