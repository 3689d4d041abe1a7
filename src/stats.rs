//! Rebuilds per-region statistics records from a JSON-stat response.
//!
//! The value array is flattened with the region as the slow-varying dimension
//! and the two measures (inflow, outflow) as the fast-varying one:
//!
//! ```text
//! value = [in(r0), out(r0), in(r1), out(r1), ...]
//! ```
//!
//! That order is declared by the query, not by the response metadata, so the
//! decoder validates the array length against the layout before reading.

use crate::error::{Error, Result};
use crate::models::{CanonicalKey, JsonStat, StatisticsIndex, StatisticsRecord};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Region codes in the statistics source share this prefix.
const REGION_CODE_PREFIX: &str = "KU";

/// Shape of the flattened value array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLayout {
    pub region_count: usize,
    pub measures_per_region: usize,
}

impl ValueLayout {
    /// Inflow and outflow per region.
    pub const MEASURES: usize = 2;

    pub fn for_regions(region_count: usize) -> Self {
        Self {
            region_count,
            measures_per_region: Self::MEASURES,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.region_count * self.measures_per_region
    }

    /// Fail fast if the value array cannot have been produced by this layout.
    pub fn validate(&self, values: &[u64]) -> Result<()> {
        if values.len() != self.expected_len() {
            return Err(Error::MalformedResponse(format!(
                "value array has {} entries, expected {} ({} regions x {} measures)",
                values.len(),
                self.expected_len(),
                self.region_count,
                self.measures_per_region
            )));
        }
        Ok(())
    }
}

/// Builds a [`StatisticsIndex`] from a raw response.
#[derive(Debug, Clone, Default)]
pub struct StatisticsIndexBuilder {
    /// Dimension id holding the regions. `None` means auto-detect.
    region_dimension: Option<String>,
}

impl StatisticsIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region_dimension(mut self, id: impl Into<String>) -> Self {
        self.region_dimension = Some(id.into());
        self
    }

    /// Parse and decode a raw JSON response.
    pub fn build(&self, response: &Value) -> Result<StatisticsIndex> {
        let parsed: JsonStat = serde_json::from_value(response.clone())
            .map_err(|e| Error::MalformedResponse(format!("unexpected response shape: {}", e)))?;
        self.build_parsed(&parsed)
    }

    pub fn build_parsed(&self, js: &JsonStat) -> Result<StatisticsIndex> {
        let dim_id = self.pick_region_dimension(js)?;
        let category = &js.dimension[dim_id].category;
        if category.index.is_empty() {
            return Err(Error::MalformedResponse(format!(
                "dimension '{}' has an empty category index",
                dim_id
            )));
        }

        let codes = category.index.ordered_codes();
        let layout = ValueLayout::for_regions(codes.len());
        layout.validate(&js.value)?;

        let mut records: BTreeMap<CanonicalKey, StatisticsRecord> = BTreeMap::new();
        for (i, code) in codes.iter().enumerate() {
            let base = i * layout.measures_per_region;
            let record = StatisticsRecord {
                positive: js.value[base],
                negative: js.value[base + 1],
            };
            let key = CanonicalKey::new(code.trim());
            if records.insert(key.clone(), record).is_some() {
                warn!("duplicate statistics entry for {}; keeping the last one", key);
            }
        }

        debug!(
            "decoded {} statistics records from dimension '{}'",
            records.len(),
            dim_id
        );
        Ok(records.into_iter().collect())
    }

    fn pick_region_dimension<'a>(&'a self, js: &'a JsonStat) -> Result<&'a str> {
        if js.dimension.is_empty() {
            return Err(Error::MalformedResponse("response has no dimensions".into()));
        }

        if let Some(id) = &self.region_dimension {
            return js
                .dimension
                .get_key_value(id)
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| {
                    Error::MalformedResponse(format!("region dimension '{}' not found", id))
                });
        }

        // Dimension order from `id` when present, otherwise key order.
        let order: Vec<&str> = if js.id.is_empty() {
            js.dimension.keys().map(String::as_str).collect()
        } else {
            js.id
                .iter()
                .map(String::as_str)
                .filter(|id| js.dimension.contains_key(*id))
                .collect()
        };

        let by_prefix = order.iter().copied().find(|id| {
            js.dimension[*id]
                .category
                .index
                .ordered_codes()
                .iter()
                .any(|code| code.starts_with(REGION_CODE_PREFIX))
        });

        by_prefix
            .or_else(|| order.first().copied())
            .ok_or_else(|| Error::MalformedResponse("no usable region dimension".into()))
    }
}

/// Build an index with region-dimension auto-detection.
pub fn build_index(response: &Value) -> Result<StatisticsIndex> {
    StatisticsIndexBuilder::new().build(response)
}
