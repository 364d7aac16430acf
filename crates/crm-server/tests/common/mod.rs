//! Shared helpers: a router wired to a wiremock upstream and a request driver.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use crm_core::config::AppConfig;
use crm_server::{build_router, AppState, API_KEY_HEADER};
use tower::ServiceExt;
use wiremock::MockServer;

pub const API_VERSION: &str = "2021-07-28";

/// Matches requests that carry no `nextPageToken` query parameter.
pub struct FirstPage;

impl wiremock::Match for FirstPage {
    fn matches(&self, request: &wiremock::Request) -> bool {
        !request
            .url
            .query_pairs()
            .any(|(key, _)| key == "nextPageToken")
    }
}

pub fn router_for(server: &MockServer) -> Router {
    let mut config = AppConfig::default();
    config.upstream.base_url = server.uri();
    config.upstream.api_version = API_VERSION.into();
    build_router(AppState::new(config).expect("app state"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// GET `uri` with an optional `x-api-key`.
pub async fn get(router: Router, uri: &str, api_key: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    let resp = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
