use crate::color::Rgb8;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized region code shared by the geometry and statistics sides, e.g. `KU091`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Migration counts for one region: `positive` is inflow, `negative` is outflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub positive: u64,
    pub negative: u64,
}

impl StatisticsRecord {
    pub fn new(positive: u64, negative: u64) -> Self {
        Self { positive, negative }
    }

    /// Net migration (`positive - negative`).
    pub fn net(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }
}

/// Immutable mapping from canonical key to statistics, built once per data load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsIndex {
    records: BTreeMap<CanonicalKey, StatisticsRecord>,
}

impl StatisticsIndex {
    pub fn get(&self, key: &CanonicalKey) -> Option<&StatisticsRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, &StatisticsRecord)> {
        self.records.iter()
    }
}

impl FromIterator<(CanonicalKey, StatisticsRecord)> for StatisticsIndex {
    fn from_iter<I: IntoIterator<Item = (CanonicalKey, StatisticsRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Property fields that may carry the display name, in lookup order.
pub const NAME_FIELDS: [&str; 2] = ["namefin", "name"];

/// One feature of the geometry collection. The geometry is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub properties: Map<String, Value>,
    pub geometry: Option<geojson::Geometry>,
}

impl RegionFeature {
    pub fn new(properties: Map<String, Value>, geometry: Option<geojson::Geometry>) -> Self {
        Self {
            properties,
            geometry,
        }
    }

    /// Display name from `namefin`, falling back to `name`.
    pub fn display_name(&self) -> Option<&str> {
        NAME_FIELDS
            .iter()
            .filter_map(|field| self.properties.get(*field))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

impl From<geojson::Feature> for RegionFeature {
    fn from(f: geojson::Feature) -> Self {
        Self {
            properties: f.properties.unwrap_or_default(),
            geometry: f.geometry,
        }
    }
}

/// A geometry feature fused with its statistics (if any) and its base color.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRegion {
    pub feature: RegionFeature,
    pub key: Option<CanonicalKey>,
    pub record: Option<StatisticsRecord>,
    /// `positive - negative`; present exactly when `record` is.
    pub net: Option<i64>,
    /// Hue derived from the record; `None` for a join miss.
    pub hue: Option<f64>,
    /// Base fill/stroke color, computed once at join time.
    pub base_color: Rgb8,
}

impl JoinedRegion {
    pub fn name(&self) -> Option<&str> {
        self.feature.display_name()
    }

    pub fn is_matched(&self) -> bool {
        self.record.is_some()
    }
}

// ------------------------ JSON-stat response shape ------------------------

/// Statistics response as returned by the PxWeb API in `json-stat2` format.
///
/// Only the parts the index builder relies on are modelled: the dimension
/// order (`id`), each dimension's category index, and the flat value array.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonStat {
    #[serde(default)]
    pub id: Vec<String>,
    pub dimension: BTreeMap<String, Dimension>,
    /// Non-numeric or null cells are read as 0.
    #[serde(deserialize_with = "de_lenient_counts")]
    pub value: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dimension {
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub index: CategoryIndex,
}

/// JSON-stat allows the category index either as `{code: ordinal}` or as an
/// ordered array of codes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    Positions(BTreeMap<String, usize>),
    Ordered(Vec<String>),
}

impl CategoryIndex {
    /// Codes sorted by ordinal position; ties fall back to code order.
    pub fn ordered_codes(&self) -> Vec<&str> {
        match self {
            CategoryIndex::Positions(map) => {
                let mut entries: Vec<(&str, usize)> =
                    map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
                entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
                entries.into_iter().map(|(k, _)| k).collect()
            }
            CategoryIndex::Ordered(codes) => codes.iter().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CategoryIndex::Positions(map) => map.len(),
            CategoryIndex::Ordered(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serde helper: read a JSON array of counts. Numbers and numeric strings are
/// taken as counts; every other cell (`null`, `".."`, objects, arrays) is 0.
fn de_lenient_counts<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let cells: Vec<LenientCount> = Vec::deserialize(deserializer)?;
    Ok(cells.into_iter().map(|c| c.0).collect())
}

struct LenientCount(u64);

impl<'de> Deserialize<'de> for LenientCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        struct CountVisitor;

        impl<'de> Visitor<'de> for CountVisitor {
            type Value = LenientCount;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a count cell")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(v.max(0) as u64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(count_from_f64(v)))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let n = s.trim().parse::<f64>().map(count_from_f64).unwrap_or(0);
                Ok(LenientCount(n))
            }

            fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(0))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(0))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientCount(0))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}
                Ok(LenientCount(0))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
                Ok(LenientCount(0))
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}

fn count_from_f64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_counts_default_to_zero() {
        let raw = r#"{"dimension":{},"value":[4, "7", null, "..", -3, 2.0, true, {"x":1}, [5]]}"#;
        let js: JsonStat = serde_json::from_str(raw).unwrap();
        assert_eq!(js.value, vec![4, 7, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn category_index_sorted_by_ordinal() {
        let idx: CategoryIndex = serde_json::from_str(r#"{"KU009":2,"KU005":1}"#).unwrap();
        assert_eq!(idx.ordered_codes(), vec!["KU005", "KU009"]);

        let idx: CategoryIndex = serde_json::from_str(r#"["KU091","KU049"]"#).unwrap();
        assert_eq!(idx.ordered_codes(), vec!["KU091", "KU049"]);
    }

    #[test]
    fn display_name_prefers_namefin() {
        let mut props = Map::new();
        props.insert("name".into(), Value::from("Helsingfors"));
        props.insert("namefin".into(), Value::from("Helsinki"));
        let f = RegionFeature::new(props, None);
        assert_eq!(f.display_name(), Some("Helsinki"));
    }

    #[test]
    fn net_may_be_negative() {
        assert_eq!(StatisticsRecord::new(3, 10).net(), -7);
    }
}
