use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Municipality boundaries (WFS, GeoJSON output in WGS84).
pub const DEFAULT_GEOMETRY_URL: &str = "https://geo.stat.fi/geoserver/wfs?service=WFS&version=2.0.0&request=GetFeature&typeName=tilastointialueet:kunta4500k&outputFormat=json&srsName=EPSG:4326";

/// PxWeb table with inflow/outflow by municipality. The query document picks
/// the year and the two measures.
pub const DEFAULT_STATISTICS_URL: &str =
    "https://pxdata.stat.fi/PxWeb/api/v1/fi/StatFin/muutl/statfin_muutl_pxt_11a2.px";

/// Where the two sources live and how long to wait for them.
///
/// Every field is optional in the TOML file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub geometry_url: String,
    pub statistics_url: String,
    /// Dimension id holding the regions in the statistics response.
    /// When unset, the dimension whose codes start with `KU` is used.
    pub region_dimension: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            geometry_url: DEFAULT_GEOMETRY_URL.into(),
            statistics_url: DEFAULT_STATISTICS_URL.into(),
            region_dimension: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: SourceConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Index builder honouring `region_dimension`.
    pub fn index_builder(&self) -> crate::stats::StatisticsIndexBuilder {
        let builder = crate::stats::StatisticsIndexBuilder::new();
        match &self.region_dimension {
            Some(id) => builder.region_dimension(id.clone()),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: SourceConfig = toml::from_str(
            r#"
            region_dimension = "Alue"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.region_dimension.as_deref(), Some("Alue"));
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.geometry_url, DEFAULT_GEOMETRY_URL);
    }
}
