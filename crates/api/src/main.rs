//! Persona chat gateway server.

use std::sync::Arc;

use api::{AppState, Config};
use database::{import_seed, Database, SeedDocument};
use orchestrator::Gateway;
use provider_client::ProviderClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting persona gateway");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    if let Some(path) = &config.seed_path {
        info!(path = %path.display(), "Importing persona seed");
        let json = tokio::fs::read_to_string(path).await?;
        let document = SeedDocument::from_json(&json)?;
        import_seed(db.pool(), &document).await?;
    }

    // Model providers
    let provider = ProviderClient::from_env()?;

    let gateway = Gateway::new(Arc::new(db), Arc::new(provider));
    let app = api::app(AppState::new(gateway));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Persona gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
