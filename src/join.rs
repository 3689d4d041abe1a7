//! Fuses geometry features with statistics records.

use crate::color::{self, NO_DATA};
use crate::error::{Error, Result};
use crate::models::{CanonicalKey, JoinedRegion, RegionFeature, StatisticsIndex};
use crate::normalize::normalize;
use crate::stats::StatisticsIndexBuilder;
use geojson::GeoJson;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attach the matching record (if any) to a feature. Never fails: a missing
/// code field or an unknown key yields a region without statistics.
pub fn join(feature: RegionFeature, index: &StatisticsIndex) -> JoinedRegion {
    let key = normalize(&feature.properties);
    let record = key.as_ref().and_then(|k| index.get(k)).copied();
    let hue = record.map(|r| color::hue_for(r.positive, r.negative));
    let base_color = hue.map(color::hue_to_color).unwrap_or(NO_DATA);

    JoinedRegion {
        feature,
        key,
        record,
        net: record.map(|r| r.net()),
        hue,
        base_color,
    }
}

/// Parse a GeoJSON FeatureCollection into region features.
pub fn parse_features(raw_geometry: &Value) -> Result<Vec<RegionFeature>> {
    let geojson = GeoJson::from_json_value(raw_geometry.clone())
        .map_err(|e| Error::MalformedGeometry(e.to_string()))?;
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            Ok(fc.features.into_iter().map(RegionFeature::from).collect())
        }
        _ => Err(Error::MalformedGeometry(
            "expected a FeatureCollection".into(),
        )),
    }
}

/// Single entry point for the rendering layer: parse both payloads and join
/// every feature. Structural failures of either payload are returned before
/// any region is produced.
pub fn build_joined_regions(raw_geometry: &Value, raw_statistics: &Value) -> Result<Vec<JoinedRegion>> {
    build_joined_regions_with(raw_geometry, raw_statistics, &StatisticsIndexBuilder::new())
}

/// Same as [`build_joined_regions`] with an explicitly configured index builder.
pub fn build_joined_regions_with(
    raw_geometry: &Value,
    raw_statistics: &Value,
    builder: &StatisticsIndexBuilder,
) -> Result<Vec<JoinedRegion>> {
    let index = builder.build(raw_statistics)?;
    let features = parse_features(raw_geometry)?;
    let regions = join_all(features, &index);
    debug!(
        "joined {} features against {} statistics records",
        regions.len(),
        index.len()
    );
    Ok(regions)
}

/// Join a whole collection and report features that normalize to the same key.
pub fn join_all(features: Vec<RegionFeature>, index: &StatisticsIndex) -> Vec<JoinedRegion> {
    let regions: Vec<JoinedRegion> = features.into_iter().map(|f| join(f, index)).collect();

    for (key, count) in key_collisions(&regions) {
        warn!("{} features share join key {}; they receive the same statistics", count, key);
    }
    regions
}

/// Keys claimed by more than one region, with the number of claimants.
/// Codes of 1000 and above truncate onto shorter codes, which shows up here.
pub fn key_collisions(regions: &[JoinedRegion]) -> Vec<(CanonicalKey, usize)> {
    let mut counts: BTreeMap<&CanonicalKey, usize> = BTreeMap::new();
    for key in regions.iter().filter_map(|r| r.key.as_ref()) {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, n)| (k.clone(), n))
        .collect()
}

/// Totals over a joined collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub regions: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub total_positive: u64,
    pub total_negative: u64,
    pub total_net: i64,
}

pub fn summarize(regions: &[JoinedRegion]) -> JoinSummary {
    let mut s = JoinSummary {
        regions: regions.len(),
        ..Default::default()
    };
    for r in regions {
        match r.record {
            Some(rec) => {
                s.matched += 1;
                s.total_positive += rec.positive;
                s.total_negative += rec.negative;
                s.total_net += rec.net();
            }
            None => s.unmatched += 1,
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatisticsRecord;
    use serde_json::{Map, json};

    fn feature(props: Value) -> RegionFeature {
        RegionFeature::new(props.as_object().cloned().unwrap_or_default(), None)
    }

    fn index() -> StatisticsIndex {
        [
            ("KU005".into(), StatisticsRecord::new(10, 2)),
            ("KU009".into(), StatisticsRecord::new(3, 5)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn hit_attaches_record_and_net() {
        let r = join(feature(json!({"kunta": 5, "namefin": "Alajärvi"})), &index());
        assert_eq!(r.record, Some(StatisticsRecord::new(10, 2)));
        assert_eq!(r.net, Some(8));
        assert_eq!(r.hue, Some(120.0));
    }

    #[test]
    fn misses_are_absent_not_errors() {
        let no_key = join(RegionFeature::new(Map::new(), None), &index());
        assert!(no_key.key.is_none());
        assert!(no_key.record.is_none());
        assert_eq!(no_key.base_color, NO_DATA);

        let unknown = join(feature(json!({"kunta": 999})), &index());
        assert_eq!(unknown.key, Some("KU999".into()));
        assert!(unknown.net.is_none());
    }

    #[test]
    fn collisions_are_reported() {
        let regions = join_all(
            vec![feature(json!({"kunta": 5})), feature(json!({"kunta": 1005}))],
            &index(),
        );
        assert_eq!(key_collisions(&regions), vec![("KU005".into(), 2)]);
    }

    #[test]
    fn summary_counts_matches() {
        let regions = join_all(
            vec![
                feature(json!({"kunta": 5})),
                feature(json!({"kunta": 9})),
                feature(json!({"name": "Nowhere"})),
            ],
            &index(),
        );
        let s = summarize(&regions);
        assert_eq!(s.matched, 2);
        assert_eq!(s.unmatched, 1);
        assert_eq!(s.total_positive, 13);
        assert_eq!(s.total_negative, 7);
        assert_eq!(s.total_net, 6);
    }
}
