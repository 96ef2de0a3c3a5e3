use anyhow::Result;
use storefront_core::{build_credential_app, init_tracing, serve, CredentialServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Starting Credential Authority v{}...",
        env!("CARGO_PKG_VERSION")
    );

    let config = CredentialServiceConfig::from_env()?;
    let app = build_credential_app(&config).await?;

    serve(app, &config.server.bind_addr).await?;

    Ok(())
}
