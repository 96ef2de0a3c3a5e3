use anyhow::Result;
use storefront_core::{build_inventory_app, init_tracing, serve, InventoryServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting Inventory Ledger v{}...", env!("CARGO_PKG_VERSION"));

    let config = InventoryServiceConfig::from_env()?;
    let app = build_inventory_app(&config).await?;

    serve(app, &config.server.bind_addr).await?;

    Ok(())
}
