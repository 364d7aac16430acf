//! End-to-end tests for `/ai-metrics` against a mocked CRM API.

mod common;

use axum::http::{header, StatusCode};
use common::{get, router_for, FirstPage, API_VERSION};
use serde_json::json;
use wiremock::matchers::{any, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const METRICS_URI: &str = "/ai-metrics?from=2024-01-01&to=2024-01-02&locationId=loc-1";

#[tokio::test]
async fn test_single_conversation_scenario() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .and(header_eq("authorization", "Bearer secret"))
        .and(header_eq("version", API_VERSION))
        .and(query_param("locationId", "loc-1"))
        .and(query_param("startDate", "2024-01-01T00:00:00Z"))
        .and(query_param("endDate", "2024-01-02T23:59:59Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "conv-1", "contactId": "c1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1/messages"))
        .and(header_eq("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"direction": "outbound", "dateAdded": "2024-01-01T10:00:00Z"},
                {"direction": "inbound", "dateAdded": "2024-01-01T11:00:00Z"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        json!({
            "counts": {
                "totalOutboundMessages": 1,
                "uniqueMessagedContacts": 1,
                "conversationsReplied": 1
            },
            "breakdown": [{"date": "2024-01-01", "value": 1}]
        })
    );
    assert_eq!(resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization, x-api-key"
    );
}

#[tokio::test]
async fn test_conversation_pages_are_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "a", "contactId": "c1"}],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .and(query_param("nextPageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "b", "contactId": "c1"}, {"contactId": "c9"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    for id in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/conversations/{id}/messages")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"authorType": "AI", "createdAt": "2024-01-02T09:00:00Z"},
                    {"messageBy": "contact", "createdAt": "2024-01-02T09:05:00Z"},
                    {"direction": "outbound", "dateAdded": "2024-01-05T09:00:00Z"},
                    {"direction": "outbound"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["counts"]["totalOutboundMessages"], 2);
    assert_eq!(resp.body["counts"]["uniqueMessagedContacts"], 1);
    assert_eq!(resp.body["counts"]["conversationsReplied"], 1);
    assert_eq!(
        resp.body["breakdown"],
        json!([{"date": "2024-01-02", "value": 2}])
    );
}

#[tokio::test]
async fn test_conversation_failure_passes_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
        .expect(0)
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, json!({"error": "upstream exploded"}));
    assert!(resp
        .headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_upstream_auth_failure_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"Invalid JWT"}"#))
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("expired")).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body, json!({"error": r#"{"message":"Invalid JWT"}"#}));
}

#[tokio::test]
async fn test_message_failure_mid_pagination_is_soft() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "conv-1", "contactId": "c1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1/messages"))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"direction": "outbound", "dateAdded": "2024-01-01T10:00:00Z"},
                {"messageBy": "user", "dateAdded": "2024-01-02T10:00:00Z"}
            ],
            "nextPageToken": "m-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1/messages"))
        .and(query_param("nextPageToken", "m-2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["counts"]["totalOutboundMessages"], 2);
    assert_eq!(resp.body["counts"]["conversationsReplied"], 0);
    assert_eq!(
        resp.body["breakdown"],
        json!([
            {"date": "2024-01-01", "value": 1},
            {"date": "2024-01-02", "value": 1}
        ])
    );
}

#[tokio::test]
async fn test_malformed_upstream_json_is_internal_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_missing_api_key_makes_no_upstream_calls() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body, json!({"error": "Missing x-api-key"}));
}

#[tokio::test]
async fn test_inverted_range_yields_zero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "conv-1", "contactId": "c1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"direction": "outbound", "dateAdded": "2024-01-15T10:00:00Z"}]
        })))
        .mount(&server)
        .await;

    let resp = get(
        router_for(&server),
        "/ai-metrics?from=2024-02-01&to=2024-01-01&locationId=loc-1",
        Some("secret"),
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["counts"]["totalOutboundMessages"], 0);
    assert_eq!(resp.body["breakdown"], json!([]));
}

#[tokio::test]
async fn test_numeric_upstream_ids_are_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": 7, "contactId": 42}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"direction": "outbound", "dateAdded": "2024-01-01T10:00:00Z"},
                {"direction": "inbound", "timestamp": 1704103200000_i64}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = get(router_for(&server), METRICS_URI, Some("secret")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["counts"]["uniqueMessagedContacts"], 1);
    assert_eq!(resp.body["counts"]["conversationsReplied"], 1);
}
