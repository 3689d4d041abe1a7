use crate::interaction::{Style, VisualState, detail_for, style_for};
use crate::models::JoinedRegion;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Flat export row, one per region.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionRow {
    pub key: Option<String>,
    pub name: Option<String>,
    pub inflow: Option<u64>,
    pub outflow: Option<u64>,
    pub net: Option<i64>,
    pub hue: Option<f64>,
    pub color: String,
}

impl From<&JoinedRegion> for RegionRow {
    fn from(r: &JoinedRegion) -> Self {
        Self {
            key: r.key.as_ref().map(|k| k.to_string()),
            name: r.name().map(str::to_string),
            inflow: r.record.map(|s| s.positive),
            outflow: r.record.map(|s| s.negative),
            net: r.net,
            hue: r.hue,
            color: r.base_color.hex(),
        }
    }
}

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{}", s),
        _ => s.to_string(),
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Save regions as CSV with header. Missing statistics are empty cells.
pub fn save_csv<P: AsRef<Path>>(regions: &[JoinedRegion], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .from_path(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    wtr.write_record(["key", "name", "inflow", "outflow", "net", "hue", "color"])?;
    for row in regions.iter().map(RegionRow::from) {
        wtr.write_record([
            sanitize_cell(&row.key.unwrap_or_default()),
            sanitize_cell(&row.name.unwrap_or_default()),
            opt(row.inflow),
            opt(row.outflow),
            opt(row.net),
            row.hue.map(|h| format!("{:.2}", h)).unwrap_or_default(),
            row.color,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save regions as a pretty JSON array of [`RegionRow`].
pub fn save_json<P: AsRef<Path>>(regions: &[JoinedRegion], path: P) -> Result<()> {
    let rows: Vec<RegionRow> = regions.iter().map(RegionRow::from).collect();
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Default-state style as simplestyle properties understood by common GeoJSON viewers.
fn style_properties(style: &Style) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("fill".into(), json!(style.fill_color.hex()));
    m.insert("fill-opacity".into(), json!(style.fill_opacity));
    m.insert("stroke".into(), json!(style.stroke_color.hex()));
    m.insert("stroke-width".into(), json!(style.stroke_width));
    m
}

/// Build a styled FeatureCollection: original properties and geometry, plus
/// statistics, detail text, and default-state style.
pub fn to_styled_geojson(regions: &[JoinedRegion]) -> Value {
    let features: Vec<Value> = regions
        .iter()
        .map(|r| {
            let mut props = r.feature.properties.clone();
            let row = RegionRow::from(r);
            props.insert("netmig:key".into(), json!(row.key));
            props.insert("netmig:inflow".into(), json!(row.inflow));
            props.insert("netmig:outflow".into(), json!(row.outflow));
            props.insert("netmig:net".into(), json!(row.net));
            props.insert("netmig:detail".into(), json!(detail_for(r).body));
            props.extend(style_properties(&style_for(r, VisualState::Default)));
            json!({
                "type": "Feature",
                "properties": props,
                "geometry": r.feature.geometry,
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "features": features,
    })
}

pub fn save_geojson<P: AsRef<Path>>(regions: &[JoinedRegion], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string(&to_styled_geojson(regions))?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::join;
    use crate::models::{RegionFeature, StatisticsIndex, StatisticsRecord};
    use tempfile::tempdir;

    fn regions() -> Vec<JoinedRegion> {
        let index: StatisticsIndex = [("KU091".into(), StatisticsRecord::new(5, 3))]
            .into_iter()
            .collect();
        let f = |v: Value| RegionFeature::new(v.as_object().cloned().unwrap(), None);
        vec![
            join(f(json!({"kunta": 91, "namefin": "Helsinki"})), &index),
            join(f(json!({"namefin": "=cmd"})), &index),
        ]
    }

    #[test]
    fn write_csv_json_geojson() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let geop = dir.path().join("x.geojson");
        let rs = regions();
        save_csv(&rs, &csvp).unwrap();
        save_json(&rs, &jsonp).unwrap();
        save_geojson(&rs, &geop).unwrap();

        let csv_txt = std::fs::read_to_string(&csvp).unwrap();
        assert!(csv_txt.contains("KU091,Helsinki,5,3,2,"));
        assert!(csv_txt.contains("'=cmd"));
        assert!(jsonp.exists());
        assert!(geop.exists());
    }
}
