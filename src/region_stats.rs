//! # Region Stats
//! Sliding window of per-region scan outcomes, used to feed the
//! `region_zombie_rate` feature. Regions with no observed history fall
//! back to the configured prior.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// One scan observation: how many resources were seen in the region and
/// how many of them were zombies.
#[derive(Debug, Clone, Copy)]
struct Sample {
    ts_unix: u64,
    zombies: u32,
    total: u32,
}

/// Thread-safe rolling window of zombie rates per region.
#[derive(Debug)]
pub struct RegionStats {
    inner: Mutex<HashMap<String, VecDeque<Sample>>>,
    window: Duration,
}

impl RegionStats {
    pub fn with_window(window: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Convenience constructor for the default 30-day window.
    pub fn new_30d() -> Self {
        Self::with_window(Duration::from_secs(30 * 24 * 3600))
    }

    /// Record one scan's outcome for a region. If `ts_unix` is `None`,
    /// current time is used. Entries older than the window are discarded.
    pub fn record(&self, region: &str, zombies: u32, total: u32, ts_unix: Option<u64>) {
        let now = now_unix();
        let ts = ts_unix.unwrap_or(now);
        let cutoff = now.saturating_sub(self.window.as_secs());

        let mut inner = self.inner.lock().expect("region stats mutex poisoned");
        let buf = inner.entry(region.to_string()).or_default();
        buf.push_back(Sample {
            ts_unix: ts,
            zombies,
            total,
        });
        while let Some(s) = buf.front() {
            if s.ts_unix < cutoff {
                buf.pop_front();
            } else {
                break;
            }
        }
    }

    /// Historical zombie fraction for the region within the window, or
    /// `prior` when nothing has been observed yet.
    pub fn rate_for(&self, region: &str, prior: f32) -> f32 {
        let now = now_unix();
        let cutoff = now.saturating_sub(self.window.as_secs());

        let inner = self.inner.lock().expect("region stats mutex poisoned");
        let Some(buf) = inner.get(region) else {
            return prior;
        };

        let mut zombies: u64 = 0;
        let mut total: u64 = 0;
        for s in buf.iter().rev() {
            if s.ts_unix < cutoff {
                break; // older samples sit at the front
            }
            zombies += s.zombies as u64;
            total += s.total as u64;
        }

        if total == 0 {
            prior
        } else {
            (zombies as f32 / total as f32).clamp(0.0, 1.0)
        }
    }

    /// Number of regions with at least one sample (diagnostics).
    pub fn region_count(&self) -> usize {
        self.inner.lock().expect("region stats mutex poisoned").len()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_region_uses_prior() {
        let stats = RegionStats::new_30d();
        assert!((stats.rate_for("eu-west-1", 0.15) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn rate_reflects_recorded_scans() {
        let stats = RegionStats::new_30d();
        stats.record("us-east-1", 3, 10, None);
        stats.record("us-east-1", 1, 10, None);
        assert!((stats.rate_for("us-east-1", 0.15) - 0.2).abs() < 1e-6);
        // Other regions are unaffected.
        assert!((stats.rate_for("us-west-2", 0.15) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn samples_outside_window_are_ignored() {
        let stats = RegionStats::with_window(Duration::from_secs(100));
        let now = now_unix();
        stats.record("us-east-1", 10, 10, Some(now - 1000));
        stats.record("us-east-1", 0, 10, Some(now));
        assert!((stats.rate_for("us-east-1", 0.15) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn empty_region_total_uses_prior() {
        let stats = RegionStats::new_30d();
        stats.record("us-east-1", 0, 0, None);
        assert!((stats.rate_for("us-east-1", 0.15) - 0.15).abs() < 1e-6);
    }
}
