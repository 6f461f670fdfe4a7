//! Integration tests for the Campaign Management bounded context.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use campaign_event_store::in_memory_event_store::InMemoryEventStore;

#[tokio::test]
async fn test_campaign_create_change_and_get_round_trip() {
    let store = Arc::new(InMemoryEventStore::new());

    // POST /api/v1/campaigns
    let app = common::build_test_app_with(store.clone());
    let (status, json) = common::post_json(
        app,
        "/api/v1/campaigns",
        &serde_json::json!({ "id": "c1", "name": "Summer Sale", "business_type": "RETAIL" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["campaign_id"], "c1");

    // POST /api/v1/campaigns/c1/change-business-type
    let app = common::build_test_app_with(store.clone());
    let (status, json) = common::post_json(
        app,
        "/api/v1/campaigns/c1/change-business-type",
        &serde_json::json!({ "business_type": "ECOMMERCE" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["business_type"], "ECOMMERCE");

    // GET /api/v1/campaigns/c1 through a fresh repository over the same store
    let app = common::build_test_app_with(store.clone());
    let (status, json) = common::get_json(app, "/api/v1/campaigns/c1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Summer Sale");
    assert_eq!(json["business_type"], "ECOMMERCE");

    let versions: Vec<i64> = store
        .stream_events("c1")
        .unwrap()
        .iter()
        .map(|record| record.version)
        .collect();
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn test_campaign_duplicate_create_returns_409() {
    let store = Arc::new(InMemoryEventStore::new());
    let body = serde_json::json!({ "id": "c1", "name": "Summer Sale" });

    let (first, _) =
        common::post_json(common::build_test_app_with(store.clone()), "/api/v1/campaigns", &body)
            .await;
    let (second, json) =
        common::post_json(common::build_test_app_with(store), "/api/v1/campaigns", &body).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["error"], "already_exists");
}

#[tokio::test]
async fn test_campaign_get_unknown_returns_404() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(app, "/api/v1/campaigns/unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "aggregate_not_found");
}

#[tokio::test]
async fn test_campaign_change_to_current_type_returns_400_and_appends_nothing() {
    let store = Arc::new(InMemoryEventStore::new());
    let (status, _) = common::post_json(
        common::build_test_app_with(store.clone()),
        "/api/v1/campaigns",
        &serde_json::json!({ "id": "c1", "name": "Sale", "business_type": "STANDARD" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = common::post_json(
        common::build_test_app_with(store.clone()),
        "/api/v1/campaigns/c1/change-business-type",
        &serde_json::json!({ "business_type": "STANDARD" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert_eq!(store.stream_events("c1").unwrap().len(), 1);
}
