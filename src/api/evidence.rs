use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::EvidenceError;
use crate::evidence::packs::{load_policy_packs, PolicyPack};
use crate::evidence::{BundleSummary, EvidenceBundle, EvidenceExport, Manifest};
use crate::integrity::{compute_integrity, IntegrityData};
use crate::scoring::{compute_score, GovernanceScore};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

impl SessionQuery {
    /// Requested session; an empty value means no filter
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Bundle plus its rendered artifacts, as returned by the bundle export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBundle {
    #[serde(flatten)]
    pub bundle: EvidenceBundle,
    pub csv: String,
    pub manifest: Manifest,
    pub readme: String,
    pub bundle_id: Uuid,
}

pub async fn get_score(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<GovernanceScore> {
    let snapshot = state.store.snapshot().await;
    Json(compute_score(&snapshot, query.session_id()))
}

pub async fn get_integrity(State(state): State<AppState>) -> Json<IntegrityData> {
    let snapshot = state.store.snapshot().await;
    Json(compute_integrity(&snapshot))
}

pub async fn export_json(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<EvidenceBundle> {
    let snapshot = state.store.snapshot().await;
    Json(state.builder.build(&snapshot, query.session_id()))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, EvidenceError> {
    let snapshot = state.store.snapshot().await;
    let bundle = state.builder.build(&snapshot, query.session_id());
    let csv = crate::evidence::csv_export::render_csv(&bundle)?;

    let disposition = format!(
        "attachment; filename=\"decisions-{}.csv\"",
        Utc::now().timestamp_millis()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub async fn export_bundle(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<ExportedBundle>, EvidenceError> {
    let snapshot = state.store.snapshot().await;
    let bundle = state.builder.build(&snapshot, query.session_id());
    let export = EvidenceExport::render(bundle)?;

    let bundle_id = Uuid::new_v4();
    state
        .bundles
        .record(BundleSummary::new(bundle_id, &export.bundle, &export.manifest));
    info!("Exported evidence bundle {}", bundle_id);

    Ok(Json(ExportedBundle {
        csv: export.files.csv,
        readme: export.files.readme.to_string(),
        manifest: export.manifest,
        bundle: export.bundle,
        bundle_id,
    }))
}

pub async fn export_zip(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, EvidenceError> {
    let snapshot = state.store.snapshot().await;
    let bundle = state.builder.build(&snapshot, query.session_id());
    let archive = EvidenceExport::render(bundle)?.archive()?;

    let disposition = format!(
        "attachment; filename=\"evidence-{}.zip\"",
        Utc::now().timestamp_millis()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    )
        .into_response())
}

pub async fn list_bundles(State(state): State<AppState>) -> Json<Vec<BundleSummary>> {
    Json(state.bundles.list())
}

pub async fn list_packs() -> Result<Json<Vec<PolicyPack>>, EvidenceError> {
    Ok(Json(load_policy_packs()?))
}
