// Test helpers are intentionally partially used
#![allow(dead_code)]

use axum::Router;
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::domain::MetricsPtr;
use storefront_core::security::{PasswordHasher, TokenIssuer, TokenSecret};
use storefront_core::{
    create_credential_router, create_inventory_router, create_noop_metrics, CredentialAuthority,
    InMemoryStore, InventoryLedger,
};
use tokio::net::TcpListener;
use tokio::time::sleep;

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup
// ============================================================================

pub fn noop_metrics() -> MetricsPtr {
    // ---
    create_noop_metrics().expect("noop metrics")
}

/// Credential Authority over a fresh in-memory store. Cost 4 keeps bcrypt fast.
pub fn credential_router(metrics: MetricsPtr) -> Router {
    // ---
    let secret = TokenSecret::new(TEST_SECRET).expect("secret");
    let service = CredentialAuthority::new(
        Arc::new(InMemoryStore::new()),
        PasswordHasher::new(4).expect("bcrypt cost"),
        TokenIssuer::new(&secret),
        metrics.clone(),
    );
    create_credential_router(Arc::new(service), metrics)
}

/// Inventory Ledger over a fresh in-memory store.
pub fn inventory_router(metrics: MetricsPtr) -> Router {
    // ---
    let service = InventoryLedger::new(Arc::new(InMemoryStore::new()), metrics.clone());
    create_inventory_router(Arc::new(service), metrics)
}

/// Username unique across a test run, within the 3..=20 length limit.
pub fn random_username() -> String {
    // ---
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("user{suffix:06}")
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---
    pub async fn new(app: Router) -> Self {
        // --
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn base_url(&self) -> String {
        // ---
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }
}
