use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use media_lists_api::{
    api::{create_router, AppState},
    db::InMemoryMembershipStore,
    error::{AppError, AppResult},
    models::{MediaType, SearchItem, SearchResponse, SearchType},
    services::{CatalogProvider, HeaderSessionProvider, RemoteSessionProvider},
};

const USER_HEADER: &str = "x-user-id";

/// Catalog stand-in that echoes the query back as a single movie
struct EchoCatalog;

#[async_trait::async_trait]
impl CatalogProvider for EchoCatalog {
    async fn search(
        &self,
        query: &str,
        page: u32,
        search_type: SearchType,
    ) -> AppResult<SearchResponse> {
        if query == "upstream-down" {
            return Err(AppError::ExternalApi("TMDB returned 503".to_string()));
        }
        Ok(SearchResponse {
            page,
            total_pages: 1,
            results: vec![SearchItem {
                id: "movie:603".to_string(),
                title: format!("{} ({})", query, search_type.as_str()),
                media_type: MediaType::Movie,
                poster_url: None,
                overview: None,
                release_date: Some("1999-03-30".to_string()),
                vote_average: Some(8.2),
            }],
        })
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

fn create_test_server_with_catalog(catalog: Option<Arc<dyn CatalogProvider>>) -> TestServer {
    let state = AppState::new(
        Arc::new(InMemoryMembershipStore::new()),
        Arc::new(HeaderSessionProvider::new(USER_HEADER)),
        catalog,
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with_catalog(Some(Arc::new(EchoCatalog)))
}

fn user(id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_HEADER),
        HeaderValue::from_str(id).unwrap(),
    )
}

async fn add(server: &TestServer, user_id: &str, body: Value) -> axum_test::TestResponse {
    let (name, value) = user(user_id);
    server.post("/list/add").add_header(name, value).json(&body).await
}

async fn remove(server: &TestServer, user_id: &str, body: Value) -> axum_test::TestResponse {
    let (name, value) = user(user_id);
    server
        .post("/list/remove")
        .add_header(name, value)
        .json(&body)
        .await
}

async fn list(server: &TestServer, user_id: &str, query: &str) -> axum_test::TestResponse {
    let (name, value) = user(user_id);
    server
        .get(&format!("/list?{}", query))
        .add_header(name, value)
        .await
}

fn movie(media_id: &str, list_type: &str) -> Value {
    json!({
        "mediaId": media_id,
        "mediaType": "movie",
        "title": "X",
        "listType": list_type
    })
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let request_id = "6f1c8a52-3b0e-4f6a-9d55-2a4c0b8e9f10";
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(request_id),
        )
        .await;
    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_list_carries_request_id() {
    let server = create_test_server();
    let request_id = "0b6e2f7d-8a41-4c3e-b2d9-5f7a1c9e3d24";
    let (name, value) = user("U");
    let response = server
        .get("/list?type=FAVORITE")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(request_id),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_add_list_remove_scenario() {
    let server = create_test_server();

    // First add creates the row
    let response = add(&server, "U", movie("movie:299536", "FAVORITE")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Added to FAVORITE");
    assert_eq!(body["data"]["mediaId"], "movie:299536");
    assert_eq!(body["data"]["listType"], "FAVORITE");
    assert_eq!(body["data"]["userId"], "U");

    // Repeat is a successful no-op
    let response = add(&server, "U", movie("movie:299536", "FAVORITE")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());

    let response = list(&server, "U", "type=FAVORITE&page=1&limit=20").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["totalPages"], 1);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["mediaId"], "movie:299536");
    assert_eq!(results[0]["mediaType"], "movie");

    let response = remove(
        &server,
        "U",
        json!({ "mediaId": "movie:299536", "listType": "FAVORITE" }),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Removed from FAVORITE");
    assert_eq!(body["data"]["mediaId"], "movie:299536");

    let response = list(&server, "U", "type=FAVORITE&page=1&limit=20").await;
    let body: Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert_eq!(body["totalPages"], 0);
}

#[tokio::test]
async fn test_remove_non_member_is_success() {
    let server = create_test_server();
    let response = remove(
        &server,
        "U",
        json!({ "mediaId": "tv:1399", "listType": "WATCHLIST" }),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_same_media_in_multiple_lists() {
    let server = create_test_server();

    add(&server, "U", movie("movie:603", "FAVORITE"))
        .await
        .assert_status_ok();
    let response = add(&server, "U", movie("movie:603", "WATCHLIST")).await;
    let body: Value = response.json();
    assert!(!body["data"].is_null());

    remove(
        &server,
        "U",
        json!({ "mediaId": "movie:603", "listType": "FAVORITE" }),
    )
    .await
    .assert_status_ok();

    let favorites: Value = list(&server, "U", "type=FAVORITE").await.json();
    let watchlist: Value = list(&server, "U", "type=WATCHLIST").await.json();
    assert_eq!(favorites["results"].as_array().unwrap().len(), 0);
    assert_eq!(watchlist["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lists_are_isolated_per_user() {
    let server = create_test_server();

    add(&server, "alice", movie("movie:603", "WATCHED"))
        .await
        .assert_status_ok();
    add(&server, "bob", movie("movie:603", "WATCHED"))
        .await
        .assert_status_ok();
    add(&server, "bob", movie("movie:604", "WATCHED"))
        .await
        .assert_status_ok();

    let alice: Value = list(&server, "alice", "type=WATCHED").await.json();
    let results = alice["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["mediaId"], "movie:603");
    assert!(results[0].get("userId").is_none());

    // bob removing his copy leaves alice's row alone
    remove(
        &server,
        "bob",
        json!({ "mediaId": "movie:603", "listType": "WATCHED" }),
    )
    .await
    .assert_status_ok();
    let alice: Value = list(&server, "alice", "type=WATCHED").await.json();
    assert_eq!(alice["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_newest_first_and_paginated() {
    let server = create_test_server();
    for id in 1..=5 {
        add(&server, "U", movie(&format!("movie:{}", id), "WATCHLIST"))
            .await
            .assert_status_ok();
    }

    let page1: Value = list(&server, "U", "type=WATCHLIST&page=1&limit=2").await.json();
    assert_eq!(page1["totalPages"], 3);
    let results = page1["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["mediaId"], "movie:5");
    assert_eq!(results[1]["mediaId"], "movie:4");

    let all: Value = list(&server, "U", "type=WATCHLIST&limit=100").await.json();
    let timestamps: Vec<DateTime<Utc>> = all["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["createdAt"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(timestamps.len(), 5);
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));

    // Past the end is empty, not an error
    let response = list(&server, "U", "type=WATCHLIST&page=9&limit=2").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 9);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let server = create_test_server();

    let response = server
        .post("/list/add")
        .json(&movie("movie:1", "FAVORITE"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unauthorized");

    server
        .post("/list/remove")
        .json(&json!({ "mediaId": "movie:1", "listType": "FAVORITE" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/list?type=FAVORITE")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthenticated_malformed_body_is_unauthorized() {
    let server = create_test_server();

    for path in ["/list/add", "/list/remove"] {
        let response = server
            .post(path)
            .content_type("application/json")
            .text("{not json")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_auth_server_failure_is_bad_gateway() {
    let auth = Router::new().route(
        "/api/auth/get-session",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "auth down") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, auth).await.unwrap();
    });

    let state = AppState::new(
        Arc::new(InMemoryMembershipStore::new()),
        Arc::new(RemoteSessionProvider::new(format!("http://{}", addr))),
        None,
    );
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .get("/list?type=FAVORITE")
        .add_header(header::COOKIE, HeaderValue::from_static("session=abc"))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to reach upstream service");
}

#[tokio::test]
async fn test_add_invalid_list_type_lists_valid_values() {
    let server = create_test_server();
    let response = add(&server, "U", movie("movie:299536", "INVALID")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("FAVORITE"));
    assert!(message.contains("WATCHED"));
    assert!(message.contains("WATCHLIST"));
}

#[tokio::test]
async fn test_add_missing_fields() {
    let server = create_test_server();
    let response = add(&server, "U", json!({ "mediaId": "movie:1", "listType": "FAVORITE" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Missing required fields: mediaType, title");
}

#[tokio::test]
async fn test_add_invalid_media_type() {
    let server = create_test_server();
    let response = add(
        &server,
        "U",
        json!({
            "mediaId": "person:31",
            "mediaType": "person",
            "title": "Tom Hanks",
            "listType": "FAVORITE"
        }),
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_media_id_must_match_media_type() {
    let server = create_test_server();
    let response = add(
        &server,
        "U",
        json!({
            "mediaId": "tv:1399",
            "mediaType": "movie",
            "title": "Game of Thrones",
            "listType": "WATCHLIST"
        }),
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = create_test_server();
    let (name, value) = user("U");
    let response = server
        .post("/list/add")
        .add_header(name, value)
        .content_type("application/json")
        .text("{not json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_trims_submitted_values() {
    let server = create_test_server();
    add(
        &server,
        "U",
        json!({
            "mediaId": " movie:1 ",
            "mediaType": "movie ",
            "title": "  Heat ",
            "listType": " WATCHED"
        }),
    )
    .await
    .assert_status_ok();

    let body: Value = list(&server, "U", "type=WATCHED").await.json();
    assert_eq!(body["results"][0]["mediaId"], "movie:1");
    assert_eq!(body["results"][0]["title"], "Heat");

    remove(&server, "U", json!({ "mediaId": "movie:1", "listType": "WATCHED" }))
        .await
        .assert_status_ok();
    let body: Value = list(&server, "U", "type=WATCHED").await.json();
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_remove_invalid_list_type() {
    let server = create_test_server();
    let response = remove(
        &server,
        "U",
        json!({ "mediaId": "movie:1", "listType": "LATER" }),
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_parameter_validation() {
    let server = create_test_server();

    for query in [
        "",
        "type=INVALID",
        "type=FAVORITE&page=0",
        "type=FAVORITE&limit=0",
        "type=FAVORITE&limit=101",
        "type=FAVORITE&page=abc",
    ] {
        let response = list(&server, "U", query).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    list(&server, "U", "type=FAVORITE&limit=100")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_unparseable_query_string_gets_json_error() {
    let server = create_test_server();

    let response = list(&server, "U", "type=FAVORITE&type=WATCHED").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));

    let response = server.get("/search?q=a&q=b").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
}

#[tokio::test]
async fn test_search_normalized_results() {
    let server = create_test_server();
    let response = server.get("/search?q=matrix&type=movie&page=2").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 2);
    assert_eq!(body["results"][0]["id"], "movie:603");
    assert_eq!(body["results"][0]["title"], "matrix (movie)");
    assert_eq!(body["results"][0]["mediaType"], "movie");
}

#[tokio::test]
async fn test_search_defaults_to_multi() {
    let server = create_test_server();
    let body: Value = server.get("/search?q=matrix").await.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["results"][0]["title"], "matrix (multi)");
}

#[tokio::test]
async fn test_search_validation() {
    let server = create_test_server();

    server
        .get("/search")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/search?q=%20")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/search?q=matrix&type=person")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/search?q=matrix&page=0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_without_catalog_key() {
    let server = create_test_server_with_catalog(None);
    let response = server.get("/search?q=matrix").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Catalog API key is not configured");
}

#[tokio::test]
async fn test_search_upstream_failure_is_bad_gateway() {
    let server = create_test_server();
    server
        .get("/search?q=upstream-down")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}
