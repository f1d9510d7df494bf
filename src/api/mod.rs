//! HTTP surface
//!
//! Read-only evidence endpoints under `/evidence` plus a health check.

pub mod evidence;

use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::database::OperationalStore;
use crate::evidence::{EvidenceBuilder, SharedBundleStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: OperationalStore,
    pub builder: Arc<EvidenceBuilder>,
    pub bundles: SharedBundleStore,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: OperationalStore,
        builder: EvidenceBuilder,
        bundles: SharedBundleStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            builder: Arc::new(builder),
            bundles,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/evidence/score", get(evidence::get_score))
        .route("/evidence/integrity", get(evidence::get_integrity))
        .route("/evidence/export/json", get(evidence::export_json))
        .route("/evidence/export/csv", get(evidence::export_csv))
        .route("/evidence/export/bundle", get(evidence::export_bundle))
        .route("/evidence/export/zip", get(evidence::export_zip))
        .route("/evidence/bundles", get(evidence::list_bundles))
        .route("/evidence/packs", get(evidence::list_packs))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "governance-evidence",
        "timestamp": chrono::Utc::now(),
        "database": state.store.is_connected(),
        "policyVersion": state.config.policy_version,
    }))
}
