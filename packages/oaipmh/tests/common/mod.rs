#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use catalog_oaipmh::catalog::InMemoryCatalog;
use catalog_oaipmh::config::RepositoryConfig;
use catalog_oaipmh::provider::CatalogServer;

pub const SITE_URL: &str = "https://data.example.org";

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The five-dataset, two-group catalog in `tests/fixtures/catalog.json`.
pub fn fixture_catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_path(&fixture_path("catalog.json")).unwrap()
}

pub fn config() -> RepositoryConfig {
    RepositoryConfig::new(SITE_URL)
        .with_site_title("Example Open Data")
        .with_admin_email("admin@example.org")
}

pub fn server() -> CatalogServer {
    server_with_batch_size(100)
}

pub fn server_with_batch_size(batch_size: usize) -> CatalogServer {
    CatalogServer::new(
        config().with_batch_size(batch_size),
        Arc::new(fixture_catalog()),
    )
}

pub fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}
