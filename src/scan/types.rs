// src/scan/types.rs
use anyhow::Result;

use crate::features::RawResourceRecord;

/// The feature-extractor collaborator seam: anything that can produce a
/// raw inventory snapshot. Real cloud extractors live outside this crate;
/// tests and local runs use fixtures.
#[async_trait::async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn fetch_inventory(&self) -> Result<Vec<RawResourceRecord>>;
    fn name(&self) -> &'static str;
}
