// src/scan/mod.rs
//! Scan orchestration: raw inventory → features → assessment →
//! zombie/at-risk classification → cost and summary aggregation.
//!
//! The scorer, protection rules, and region history are owned by the
//! caller and passed in, so a scan invocation has no ambient state of
//! its own.

pub mod providers;
pub mod types;

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::assessment::RiskAssessment;
use crate::cost::{self, CostSummary};
use crate::features::RawResourceRecord;
use crate::profile::ScoringProfile;
use crate::protection::ProtectionEngine;
use crate::region_stats::RegionStats;
use crate::scan::types::InventoryProvider;
use crate::scorer::Scorer;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_resources_total", "Resources seen across all scans.");
        describe_counter!("scan_zombies_total", "Resources classified as zombies.");
        describe_counter!("scan_at_risk_total", "Running resources flagged at-risk.");
        describe_counter!("scan_protected_total", "Resources excluded by protection rules.");
        describe_counter!(
            "scan_contract_violations_total",
            "Raw records rejected at the conversion boundary."
        );
        describe_counter!("scan_provider_errors_total", "Provider fetch/parse errors.");
        describe_histogram!("scan_duration_ms", "Scan wall time in milliseconds.");
        describe_gauge!("scan_last_run_ts", "Unix ts when a scan last completed.");
    });
}

/// A resource that went through the scorer.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResource {
    pub resource_id: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub region: String,
    pub status: String,
    pub monthly_cost: f64,
    pub assessment: RiskAssessment,
}

/// A resource excluded from zombie reporting by protection rules.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectedResource {
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub region: String,
    pub protection_reason: String,
}

/// A raw record rejected at the conversion boundary; reported, never
/// silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub error: String,
}

/// Zombie counts grouped for the dashboard's breakdown widgets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryStats {
    pub by_type: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_timestamp: String,
    pub regions: Vec<String>,
    pub total_resources: usize,
    pub zombies: Vec<ScoredResource>,
    pub at_risk: Vec<ScoredResource>,
    pub protected: Vec<ProtectedResource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
    pub cost_summary: CostSummary,
    pub stats: SummaryStats,
    pub duration_ms: u64,
}

/// Score a batch of raw records. Pure apart from metrics emission and the
/// region-history update at the end.
pub fn run_scan(
    records: &[RawResourceRecord],
    scorer: &dyn Scorer,
    protection: &ProtectionEngine,
    region_stats: &RegionStats,
    profile: &ScoringProfile,
) -> ScanReport {
    ensure_metrics_described();
    let started = Instant::now();
    let now = Utc::now();

    let mut zombies: Vec<ScoredResource> = Vec::new();
    let mut at_risk: Vec<ScoredResource> = Vec::new();
    let mut protected: Vec<ProtectedResource> = Vec::new();
    let mut skipped: Vec<SkippedRecord> = Vec::new();
    // region → (zombies, total scored)
    let mut region_totals: HashMap<String, (u32, u32)> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let region = record.region.clone().unwrap_or_else(|| "unknown".to_string());

        if let Some(reason) = protection.is_protected(record) {
            protected.push(ProtectedResource {
                resource_id: record.id.clone().unwrap_or_else(|| format!("record-{index}")),
                name: record.name().map(str::to_string),
                region,
                protection_reason: reason,
            });
            continue;
        }

        let rate = region_stats.rate_for(&region, profile.region_prior);
        let features = match record.to_features(now, rate) {
            Ok(f) => f,
            Err(e) => {
                warn!(index, error = %e, "inventory record rejected");
                counter!("scan_contract_violations_total").increment(1);
                skipped.push(SkippedRecord {
                    index,
                    resource_id: record.id.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let assessment = scorer.assess(&features);
        let monthly_cost = cost::monthly_cost(features.resource_type, record);
        let entry = region_totals.entry(features.region.clone()).or_insert((0, 0));
        entry.1 += 1;

        let scored = ScoredResource {
            resource_id: features.resource_id.clone(),
            resource_type: features.resource_type.label().to_string(),
            name: record.name().map(str::to_string),
            region: features.region.clone(),
            status: record.state.clone().unwrap_or_else(|| "unknown".to_string()),
            monthly_cost,
            assessment,
        };

        if features.is_stopped {
            entry.0 += 1;
            zombies.push(scored);
        } else if scored.assessment.probability >= profile.at_risk_min {
            at_risk.push(scored);
        }
    }

    // Feed this scan back into the region history so the next scan's
    // `region_zombie_rate` reflects it.
    for (region, (z, total)) in &region_totals {
        region_stats.record(region, *z, *total, None);
    }

    let cost_summary = cost::summarize(zombies.iter().filter_map(|z| {
        crate::features::ResourceType::parse(&z.resource_type).map(|ty| (ty, z.monthly_cost))
    }));

    let mut stats = SummaryStats::default();
    for z in &zombies {
        *stats.by_type.entry(z.resource_type.clone()).or_insert(0) += 1;
        *stats.by_region.entry(z.region.clone()).or_insert(0) += 1;
        *stats.by_status.entry(z.status.clone()).or_insert(0) += 1;
    }

    let mut regions: Vec<String> = region_totals.keys().cloned().collect();
    regions.sort();

    let duration_ms = started.elapsed().as_millis() as u64;
    counter!("scan_resources_total").increment(records.len() as u64);
    counter!("scan_zombies_total").increment(zombies.len() as u64);
    counter!("scan_at_risk_total").increment(at_risk.len() as u64);
    counter!("scan_protected_total").increment(protected.len() as u64);
    histogram!("scan_duration_ms").record(duration_ms as f64);
    gauge!("scan_last_run_ts").set(now.timestamp().max(0) as f64);

    info!(
        scorer = scorer.name(),
        resources = records.len(),
        zombies = zombies.len(),
        at_risk = at_risk.len(),
        protected = protected.len(),
        skipped = skipped.len(),
        "scan complete"
    );
    dev_log_zombies(&zombies);

    ScanReport {
        scan_timestamp: now.to_rfc3339(),
        regions,
        total_resources: records.len(),
        zombies,
        at_risk,
        protected,
        skipped,
        cost_summary,
        stats,
        duration_ms,
    }
}

/// Fetch inventory from every provider and scan it. A failing provider
/// is logged and skipped; the scan proceeds with whatever was fetched.
pub async fn run_once(
    providers: &[Box<dyn InventoryProvider>],
    scorer: &dyn Scorer,
    protection: &ProtectionEngine,
    region_stats: &RegionStats,
    profile: &ScoringProfile,
) -> ScanReport {
    ensure_metrics_described();

    let mut records = Vec::new();
    for p in providers {
        match p.fetch_inventory().await {
            Ok(mut v) => records.append(&mut v),
            Err(e) => {
                warn!(error = ?e, provider = p.name(), "provider error");
                counter!("scan_provider_errors_total").increment(1);
            }
        }
    }

    run_scan(&records, scorer, protection, region_stats, profile)
}

/// Dev-only visibility into what got flagged, with resource ids
/// anonymized. Never logs names or tags.
fn dev_log_zombies(zombies: &[ScoredResource]) {
    if !dev_logging_enabled() {
        return;
    }
    for z in zombies.iter().take(10) {
        info!(
            target: "scan",
            id = %anon_hash(&z.resource_id),
            tier = ?z.assessment.tier,
            probability = z.assessment.probability,
            "zombie"
        );
    }
}

/// Gate: SCAN_DEV_LOG=1 AND a dev environment (debug build or
/// APP_ENV in {local, development, dev}).
fn dev_logging_enabled() -> bool {
    let on = std::env::var("SCAN_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("APP_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
