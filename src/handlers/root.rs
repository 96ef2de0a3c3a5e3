use axum::response::IntoResponse;

pub async fn credential_root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Credential Authority
Version: {version}

Available endpoints:
  - POST   /users             - Create an account
  - POST   /authenticate      - Exchange credentials for a token
  - POST   /tokens/validate   - Resolve a token to its username
  - GET    /health            - Light health check
  - GET    /health?mode=full  - Full health check (includes store)
  - GET    /metrics           - Prometheus metrics
"#
    )
}

pub async fn inventory_root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Inventory Ledger
Version: {version}

Available endpoints:
  - GET    /items                      - Stream all items (NDJSON)
  - GET    /items/search?name={{re}}     - Stream items whose name matches (NDJSON)
  - GET    /items/{{id}}                 - Fetch an item by id
  - POST   /items                      - Insert an item
  - PUT    /items/{{id}}                 - Replace an item
  - DELETE /items/{{id}}                 - Delete an item
  - POST   /items/{{id}}/increment       - Apply a signed quantity delta
  - GET    /health                     - Light health check
  - GET    /health?mode=full           - Full health check (includes store)
  - GET    /metrics                    - Prometheus metrics
"#
    )
}
