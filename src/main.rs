use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use governance_evidence::api::{self, AppState};
use governance_evidence::config::AppConfig;
use governance_evidence::database::OperationalStore;
use governance_evidence::evidence::{EvidenceBuilder, InMemoryBundleRegistry};
use governance_evidence::redaction::Redactor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "governance_evidence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting governance evidence service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded");

    // Open the operational store read-only; failures degrade to empty data
    let store = OperationalStore::connect(&config.database_url, &config.trace_log_path).await;
    if store.is_connected() {
        info!("Database connected");
    }

    let redactor = Redactor::new()?;
    info!("Redactor ready with {} rules", redactor.rule_count());

    let builder = EvidenceBuilder::new(redactor, config.policy_version.clone());
    let bundles = Arc::new(InMemoryBundleRegistry::new(config.bundle_registry_capacity));

    let addr = config.bind_address();
    let app = api::router(AppState::new(config, store, builder, bundles));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
