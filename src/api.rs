//! Synchronous client for the two data sources behind the map.
//!
//! - Geometry: a WFS endpoint answering a plain GET with a GeoJSON FeatureCollection.
//! - Statistics: a PxWeb endpoint answering a POSTed query document with JSON-stat.
//!
//! Both retrievals of a session run concurrently; the join only starts once
//! both have succeeded. A failure of either source fails the whole session.
//!
//! Typical usage:
//! ```no_run
//! # use netmig::{Client, SourceConfig};
//! let client = Client::new(SourceConfig::default())?;
//! let query = netmig::api::read_json_file("queries/net_migration.json")?;
//! let regions = client.load_session(&query)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::config::SourceConfig;
use crate::join::build_joined_regions_with;
use crate::models::JoinedRegion;
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::redirect::Policy;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Client {
    pub config: SourceConfig,
    http: HttpClient,
}

impl Client {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs)) // total request timeout
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("netmig/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { config, http })
    }

    /// GET the geometry collection.
    pub fn fetch_geometry(&self) -> Result<Value> {
        let url = &self.config.geometry_url;
        send_json(|| self.http.get(url)).with_context(|| format!("GET {}", url))
    }

    /// POST the caller's query document to the statistics endpoint.
    pub fn fetch_statistics(&self, query: &Value) -> Result<Value> {
        let url = &self.config.statistics_url;
        send_json(|| self.http.post(url).json(query)).with_context(|| format!("POST {}", url))
    }

    /// Fetch both sources concurrently and join them.
    pub fn load_session(&self, query: &Value) -> Result<Vec<JoinedRegion>> {
        let (geometry, statistics) = std::thread::scope(|s| {
            let geometry = s.spawn(|| self.fetch_geometry());
            let statistics = s.spawn(|| self.fetch_statistics(query));
            (join_thread(geometry), join_thread(statistics))
        });
        let (geometry, statistics) = (geometry?, statistics?);
        debug!("both sources retrieved; joining");
        build_joined_regions_with(&geometry, &statistics, &self.config.index_builder())
            .context("join geometry with statistics")
    }
}

fn join_thread(handle: std::thread::ScopedJoinHandle<'_, Result<Value>>) -> Result<Value> {
    handle
        .join()
        .map_err(|_| anyhow!("retrieval thread panicked"))?
}

// Small retry for transient failures (5xx / network errors)
fn send_json(make_request: impl Fn() -> RequestBuilder) -> Result<Value> {
    let mut last_err: Option<anyhow::Error> = None;
    for backoff_ms in [100u64, 300, 700] {
        match make_request().send() {
            Ok(r) if r.status().is_success() => {
                return r.json().context("decode json");
            }
            Ok(r) if r.status().is_server_error() => {
                last_err = Some(anyhow!("HTTP {}", r.status()));
            }
            Ok(r) => bail!("request failed with HTTP {}", r.status()),
            Err(e) => last_err = Some(e.into()),
        }
        std::thread::sleep(Duration::from_millis(backoff_ms));
    }
    bail!("network error: {:?}", last_err);
}

/// Read a JSON document (query, geometry, or a saved statistics response).
pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

/// Offline counterpart of [`Client::load_session`]: both payloads from disk.
pub fn load_session_from_files(
    geometry_path: &Path,
    statistics_path: &Path,
    config: &SourceConfig,
) -> Result<Vec<JoinedRegion>> {
    let (geometry, statistics) = std::thread::scope(|s| {
        let geometry = s.spawn(|| read_json_file(geometry_path));
        let statistics = s.spawn(|| read_json_file(statistics_path));
        (join_thread(geometry), join_thread(statistics))
    });
    let (geometry, statistics) = (geometry?, statistics?);
    build_joined_regions_with(&geometry, &statistics, &config.index_builder())
        .context("join geometry with statistics")
}
