use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::features::RawResourceRecord;
use crate::scan::types::InventoryProvider;

/// Inventory provider backed by a JSON document: an array of raw
/// resource records, as an extractor would hand them over.
pub struct JsonInventoryProvider {
    raw: String,
}

impl JsonInventoryProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self { raw: s.to_string() }
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading inventory from {}", path.as_ref().display()))?;
        Ok(Self { raw })
    }

    fn parse(&self) -> Result<Vec<RawResourceRecord>> {
        let t0 = std::time::Instant::now();
        let records: Vec<RawResourceRecord> =
            serde_json::from_str(&self.raw).context("parsing inventory json")?;
        histogram!("scan_inventory_parse_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        counter!("scan_inventory_records_total").increment(records.len() as u64);
        Ok(records)
    }
}

#[async_trait]
impl InventoryProvider for JsonInventoryProvider {
    async fn fetch_inventory(&self) -> Result<Vec<RawResourceRecord>> {
        self.parse()
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
