use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::client::{ClientError, InventoryClient};
use storefront_core::domain::{
    IncrementOutcome, InventoryItem, InventoryRepository, ItemFilter, ItemId, ItemStream,
    StoreProbe,
};
use storefront_core::error::StoreError;
use storefront_core::{create_inventory_router, ErrorCode, InMemoryStore, InventoryLedger};
use tower::ServiceExt;

mod common;

async fn start() -> (common::TestServer, InventoryClient) {
    // ---
    let server = common::TestServer::new(common::inventory_router(common::noop_metrics())).await;
    let client = InventoryClient::new(server.base_url());
    (server, client)
}

#[tokio::test]
async fn item_lifecycle() {
    // ---
    let (_server, client) = start().await;

    let id = client.insert("anvil", 4).await.unwrap().to_string();
    let item = client.find_by_id(&id).await.unwrap();
    assert_eq!(item.name, "anvil");
    assert_eq!(item.quantity, 4);

    assert_eq!(client.update(&id, "heavy anvil", 6).await.unwrap(), 1);
    assert_eq!(client.find_by_id(&id).await.unwrap().name, "heavy anvil");

    assert_eq!(client.delete(&id).await.unwrap(), 1);
    let err = client.find_by_id(&id).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn deleting_twice_returns_zero() {
    // ---
    let (_server, client) = start().await;
    let id = client.insert("spade", 1).await.unwrap().to_string();

    assert_eq!(client.delete(&id).await.unwrap(), 1);
    assert_eq!(client.delete(&id).await.unwrap(), 0);
    assert_eq!(client.delete(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_purchases_leave_exact_quantity() {
    // ---
    let (_server, client) = start().await;
    let client = Arc::new(client);
    let id = client.insert("rope", 100).await.unwrap().to_string();

    let purchases = (0..50).map(|_| {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.purchase_item(&id, 1).await }
    });

    for result in futures::future::join_all(purchases).await {
        assert_eq!(result.unwrap(), 1);
    }

    assert_eq!(client.find_by_id(&id).await.unwrap().quantity, 50);
}

#[tokio::test]
async fn overselling_is_refused() {
    // ---
    let (_server, client) = start().await;
    let id = client.insert("lamp", 2).await.unwrap().to_string();

    let err = client.purchase_item(&id, 3).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InsufficientStock));
    assert_eq!(client.find_by_id(&id).await.unwrap().quantity, 2);

    assert_eq!(client.stock_item(&id, 3).await.unwrap(), 1);
    assert_eq!(client.purchase_item(&id, 5).await.unwrap(), 1);
    assert_eq!(client.find_by_id(&id).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn search_and_listing_stream_items() {
    // ---
    let (_server, client) = start().await;
    client.insert("autumn waterfall", 3).await.unwrap();
    client.insert("spring meadow", 5).await.unwrap();

    let found = client.find_by_name_pattern("waterfall").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "autumn waterfall");

    let all = client.get_all().await.unwrap();
    assert_eq!(all.len(), 2);

    assert!(client.find_by_name_pattern("glacier").await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_pattern_is_rejected_before_streaming() {
    // ---
    let (_server, client) = start().await;

    let err = client.find_by_name_pattern("([oops").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    let err = client.find_by_name_pattern("").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));
}

#[tokio::test]
async fn malformed_ids() {
    // ---
    let (_server, client) = start().await;

    let err = client.find_by_id("not-a-uuid").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    let err = client.increment_quantity("not-a-uuid", 1).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    assert_eq!(client.update("not-a-uuid", "ghost", 1).await.unwrap(), 0);
    assert_eq!(client.delete("not-a-uuid").await.unwrap(), 0);
}

#[tokio::test]
async fn listing_is_ndjson() {
    // ---
    let app = common::inventory_router(common::noop_metrics());

    let insert = app
        .clone()
        .oneshot(
            Request::post("/items")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"chisel","quantity":2}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(insert.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::get("/items").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/x-ndjson"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 1);

    let frame: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(frame["item"]["name"], "chisel");
    assert_eq!(frame["item"]["quantity"], 2);
}

#[tokio::test]
async fn negative_quantity_on_insert_is_rejected() {
    // ---
    let app = common::inventory_router(common::noop_metrics());

    let response = app
        .oneshot(
            Request::post("/items")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"hole","quantity":-1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_return_404() {
    // ---
    let app = common::inventory_router(common::noop_metrics());

    let response = app
        .oneshot(Request::get("/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Serves real rows, then fails every scan after the last one.
struct ScanCutShort(InMemoryStore);

#[async_trait::async_trait]
impl StoreProbe for ScanCutShort {
    async fn ping(&self) -> Result<(), StoreError> {
        self.0.ping().await
    }
}

#[async_trait::async_trait]
impl InventoryRepository for ScanCutShort {
    // ---
    fn scan_items(&self, filter: ItemFilter) -> ItemStream {
        let failure = futures::stream::iter([Err(StoreError::Timeout(Duration::from_secs(10)))]);
        self.0.scan_items(filter).chain(failure).boxed()
    }
    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        self.0.find_item(id).await
    }
    async fn insert_item(&self, name: String, quantity: i64) -> Result<ItemId, StoreError> {
        self.0.insert_item(name, quantity).await
    }
    async fn update_item(&self, item: InventoryItem) -> Result<u64, StoreError> {
        self.0.update_item(item).await
    }
    async fn delete_item(&self, id: ItemId) -> Result<u64, StoreError> {
        self.0.delete_item(id).await
    }
    async fn increment_quantity(
        &self,
        id: ItemId,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        self.0.increment_quantity(id, delta).await
    }
}

#[tokio::test]
async fn items_sent_before_a_stream_failure_reach_the_caller() {
    // ---
    let metrics = common::noop_metrics();
    let ledger = InventoryLedger::new(Arc::new(ScanCutShort(InMemoryStore::new())), metrics.clone());
    let server = common::TestServer::new(create_inventory_router(Arc::new(ledger), metrics)).await;
    let client = InventoryClient::new(server.base_url());

    client.insert("anvil", 1).await.unwrap();
    client.insert("bellows", 2).await.unwrap();

    let err = client.get_all().await.unwrap_err();
    assert!(matches!(err, ClientError::StreamAborted { .. }), "{err:?}");
    assert_eq!(err.code(), Some(ErrorCode::StoreTimeout));

    let names: Vec<_> = err.delivered().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["anvil", "bellows"]);
}
