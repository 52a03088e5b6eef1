use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::RawQuery, http::StatusCode, routing::get};
use rental_search::features::{
    listings::repository::HttpSearchClient,
    search::{
        client::SearchClient,
        models::{SearchFilters, SearchQuery, SuggestionKind},
        query_builder,
    },
};
use serde_json::json;
use shared::utilities::errors::SearchError;
use tokio::net::TcpListener;
use url::Url;

async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api/v1")).unwrap()
}

fn client_for(base_url: Url) -> HttpSearchClient {
    HttpSearchClient::new(base_url, reqwest::Client::new())
}

fn camera_query(page: u32) -> SearchQuery {
    query_builder::build(
        "camera",
        &SearchFilters {
            category: Some("electronics".to_string()),
            features: vec!["wifi".to_string(), "parking".to_string()],
            ..SearchFilters::default()
        },
        page,
        12,
    )
}

#[tokio::test]
async fn search_sends_query_and_parses_page() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(move |RawQuery(query): RawQuery| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = query;
                Json(json!({
                    "success": true,
                    "data": {
                        "listings": [{ "id": "a", "title": "Canon R6" }, { "_id": 7 }],
                        "total": "40"
                    }
                }))
            }
        }),
    );
    let client = client_for(serve(router).await);

    let page = client.search_listings(&camera_query(2)).await.unwrap();

    assert_eq!(page.page, 2);
    assert_eq!(page.total, 40);
    let ids: Vec<&str> = page.items.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "7"]);
    assert_eq!(page.items[0].title(), Some("Canon R6"));
    assert_eq!(
        seen.lock().unwrap().as_deref(),
        Some(
            "search=camera&category=electronics&features%5B%5D=parking&features%5B%5D=wifi&page=2&limit=12"
        )
    );
}

#[tokio::test]
async fn empty_page_is_not_an_error() {
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(|| async { Json(json!({ "success": true, "data": { "listings": [], "total": 0 } })) }),
    );
    let client = client_for(serve(router).await);

    let page = client.search_listings(&camera_query(1)).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn non_2xx_carries_backend_message() {
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "message": "Search index unavailable" })),
            )
        }),
    );
    let client = client_for(serve(router).await);

    let error = client.search_listings(&camera_query(1)).await.unwrap_err();
    assert_eq!(
        error,
        SearchError::ServerError {
            status: 503,
            message: "Search index unavailable".to_string()
        }
    );
    assert!(error.is_retryable());
}

#[tokio::test]
async fn unsuccessful_envelope_is_a_server_error() {
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(|| async { Json(json!({ "success": false, "message": "Invalid filters" })) }),
    );
    let client = client_for(serve(router).await);

    let error = client.search_listings(&camera_query(1)).await.unwrap_err();
    assert_eq!(
        error,
        SearchError::ServerError {
            status: 200,
            message: "Invalid filters".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(|| async { "<html>not json</html>" }),
    );
    let client = client_for(serve(router).await);

    let error = client.search_listings(&camera_query(1)).await.unwrap_err();
    assert!(matches!(error, SearchError::DecodeError(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let router = Router::new().route(
        "/api/v1/search/listings",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "data": { "listings": [], "total": 0 } }))
        }),
    );
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = HttpSearchClient::new(serve(router).await, http);

    let error = client.search_listings(&camera_query(1)).await.unwrap_err();
    assert_eq!(error, SearchError::Timeout);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(Url::parse(&format!("http://{addr}/api/v1")).unwrap());
    let error = client.search_listings(&camera_query(1)).await.unwrap_err();
    assert!(matches!(error, SearchError::NetworkError(_)));
}

#[tokio::test]
async fn suggestions_send_text_and_limit() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        "/api/v1/search/suggestions",
        get(move |RawQuery(query): RawQuery| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = query;
                Json(json!({
                    "success": true,
                    "data": [
                        { "text": "Canon R6", "type": "listing", "subtitle": "Electronics" },
                        { "text": "Tashkent", "type": "location" }
                    ]
                }))
            }
        }),
    );
    let client = client_for(serve(router).await);

    let suggestions = client.suggestions("cam era", 5).await.unwrap();

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].kind, SuggestionKind::Listing);
    assert_eq!(suggestions[0].subtitle.as_deref(), Some("Electronics"));
    assert_eq!(suggestions[1].kind, SuggestionKind::Location);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("q=cam+era&limit=5"));
}

#[tokio::test]
async fn missing_data_is_a_decode_error() {
    let router = Router::new().route(
        "/api/v1/search/suggestions",
        get(|| async { Json(json!({ "success": true })) }),
    );
    let client = client_for(serve(router).await);

    let error = client.suggestions("camera", 5).await.unwrap_err();
    assert!(matches!(error, SearchError::DecodeError(_)));
}
