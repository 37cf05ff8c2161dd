use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::assessment::RiskAssessment;
use crate::features::{RawResourceRecord, ResourceFeatures};
use crate::history::ScanHistory;
use crate::profile::ScoringProfile;
use crate::protection::{ProtectionConfig, ProtectionEngine};
use crate::region_stats::RegionStats;
use crate::scan::{self, ScanReport};
use crate::scorer::{build_scorer, Scorer};

pub const DEFAULT_PROTECTION_PATH: &str = "config/protection.toml";

#[derive(Clone)]
pub struct AppState {
    scorer: Arc<RwLock<Box<dyn Scorer>>>,
    profile: Arc<RwLock<ScoringProfile>>,
    protection: Arc<ProtectionEngine>,
    region_stats: Arc<RegionStats>,
    history: Arc<ScanHistory>,
}

pub fn create_router() -> Router {
    let profile = ScoringProfile::load_default();
    let protection = ProtectionEngine::new(ProtectionConfig::load_from_file(DEFAULT_PROTECTION_PATH))
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid protection config, using built-in seed");
            ProtectionEngine::from_seed()
        });

    let state = AppState {
        scorer: Arc::new(RwLock::new(build_scorer(&profile))),
        profile: Arc::new(RwLock::new(profile)),
        protection: Arc::new(protection),
        region_stats: Arc::new(RegionStats::new_30d()),
        history: Arc::new(ScanHistory::with_capacity(2000)),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/score", post(score))
        .route("/scan", post(run_scan))
        .route("/debug/history", get(debug_history))
        .route("/debug/last-scan", get(debug_last_scan))
        .route("/debug/region-rate", get(debug_region_rate))
        .route("/admin/reload-profile", get(admin_reload_profile))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct Banner {
    message: &'static str,
    services: [&'static str; 3],
}

async fn root() -> Json<Banner> {
    Json(Banner {
        message: "Zombie Risk Analyzer",
        services: [
            "Zombie Resource Scanner",
            "Risk Scoring Engine",
            "Protection Rules",
        ],
    })
}

/// Score one normalized feature record. Malformed bodies (missing
/// required fields) are rejected by the extractor with a 422 before this
/// handler runs; out-of-range numerics are clamped by the engine.
async fn score(
    State(state): State<AppState>,
    Json(features): Json<ResourceFeatures>,
) -> Json<RiskAssessment> {
    let assessment = {
        let scorer = state.scorer.read().expect("rwlock poisoned");
        scorer.assess(&features)
    };
    Json(assessment)
}

/// Scan a raw inventory batch, as handed over by the feature extractor.
async fn run_scan(
    State(state): State<AppState>,
    Json(records): Json<Vec<RawResourceRecord>>,
) -> Json<ScanReport> {
    let report = {
        let scorer = state.scorer.read().expect("rwlock poisoned");
        let profile = state.profile.read().expect("rwlock poisoned");
        scan::run_scan(
            &records,
            &**scorer,
            &state.protection,
            &state.region_stats,
            &profile,
        )
    };
    state.history.push(&report);
    Json(report)
}

#[derive(serde::Serialize)]
struct HistoryOut {
    ts_unix: u64,
    regions: Vec<String>,
    total_resources: usize,
    zombie_count: usize,
    at_risk_count: usize,
    protected_count: usize,
    monthly_cost: f64,
}

impl From<crate::history::HistoryEntry> for HistoryOut {
    fn from(h: crate::history::HistoryEntry) -> Self {
        Self {
            ts_unix: h.ts_unix,
            regions: h.regions,
            total_resources: h.total_resources,
            zombie_count: h.zombie_count,
            at_risk_count: h.at_risk_count,
            protected_count: h.protected_count,
            monthly_cost: h.monthly_cost,
        }
    }
}

async fn debug_history(State(state): State<AppState>) -> Json<Vec<HistoryOut>> {
    let rows = state.history.snapshot_last_n(10);
    Json(rows.into_iter().map(HistoryOut::from).collect())
}

async fn debug_last_scan(State(state): State<AppState>) -> Json<Option<HistoryOut>> {
    let mut rows = state.history.snapshot_last_n(1);
    Json(rows.pop().map(HistoryOut::from))
}

async fn debug_region_rate(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> String {
    let region = q.get("region").cloned().unwrap_or_default();
    let prior = state.profile.read().expect("rwlock poisoned").region_prior;
    let rate = state.region_stats.rate_for(&region, prior);
    format!("region='{}' -> rate={:.2}", region, rate)
}

async fn admin_reload_profile(State(state): State<AppState>) -> String {
    let fresh = ScoringProfile::load_default();
    let scorer = build_scorer(&fresh);
    match (state.profile.write(), state.scorer.write()) {
        (Ok(mut p), Ok(mut s)) => {
            *p = fresh;
            *s = scorer;
            "reloaded".to_string()
        }
        _ => "failed: lock poisoned".to_string(),
    }
}
