//! netmig
//!
//! Joins municipality boundaries with migration statistics and styles a
//! net-migration choropleth. Pairs with the `netmig` CLI and the `netmig-gui`
//! viewer.
//!
//! ### Features
//! - Canonical join keys (`KU` + three digits) from heterogeneous code fields
//! - Decoding of JSON-stat responses into per-region inflow/outflow records
//! - A deterministic hue scale from the inflow/outflow ratio
//! - Hover-aware styles and detail text for the rendering layer
//! - Export to CSV, JSON, or styled GeoJSON; static SVG/PNG maps
//!
//! ### Example
//! ```no_run
//! use netmig::{VisualState, build_joined_regions, detail_for, style_for};
//!
//! let geometry = netmig::api::read_json_file("kunnat.geojson")?;
//! let statistics = netmig::api::read_json_file("muutto.json")?;
//! let regions = build_joined_regions(&geometry, &statistics)?;
//! for r in &regions {
//!     let style = style_for(r, VisualState::Default);
//!     println!("{} {}", style.fill_color, detail_for(r).body);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod join;
pub mod models;
pub mod normalize;
pub mod stats;
pub mod storage;
pub mod viz;

pub use api::Client;
pub use config::SourceConfig;
pub use error::{Error, Result};
pub use interaction::{Detail, InteractionStates, Style, VisualState, detail_for, style_for};
pub use join::{build_joined_regions, join};
pub use models::{CanonicalKey, JoinedRegion, RegionFeature, StatisticsIndex, StatisticsRecord};
pub use normalize::normalize;
pub use stats::{StatisticsIndexBuilder, build_index};
