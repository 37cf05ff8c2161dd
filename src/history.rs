//! history.rs — simple in-memory log of scan summaries so the dashboard
//! can show recent activity without a persistence round-trip.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scan::ScanReport;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub ts_unix: u64,
    pub regions: Vec<String>,
    pub total_resources: usize,
    pub zombie_count: usize,
    pub at_risk_count: usize,
    pub protected_count: usize,
    pub monthly_cost: f64,
}

#[derive(Debug)]
pub struct ScanHistory {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl ScanHistory {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, report: &ScanReport) {
        let entry = HistoryEntry {
            ts_unix: now_unix(),
            regions: report.regions.clone(),
            total_resources: report.total_resources,
            zombie_count: report.zombies.len(),
            at_risk_count: report.at_risk.len(),
            protected_count: report.protected.len(),
            monthly_cost: report.cost_summary.total_monthly_savings,
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let len = v.len();
        let start = len.saturating_sub(n);
        v[start..].to_vec()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
