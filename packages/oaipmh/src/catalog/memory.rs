//! In-memory catalog, loadable from a JSON document.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Catalog, DatasetQuery};
use crate::error::{OaiError, Result};
use crate::models::{Agent, Contact, Dataset, Group, PackageDetail, Tag};

/// Catalog held entirely in memory.
///
/// Datasets and groups keep their insertion order, which is the order the
/// list verbs return them in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    datasets: Vec<Dataset>,
    details: HashMap<String, PackageDetail>,
    groups: Vec<Group>,
}

/// One dataset in a catalog file: row fields and show fields side by side.
#[derive(Debug, Deserialize)]
struct DatasetEntry {
    id: String,
    name: String,
    #[serde(default)]
    metadata_created: Option<DateTime<Utc>>,
    revision_timestamp: DateTime<Utc>,
    #[serde(default)]
    extras: BTreeMap<String, String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    license_title: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    agents: Vec<Agent>,
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    geographic_coverage: Option<String>,
    #[serde(default)]
    temporal_coverage_begin: Option<String>,
    #[serde(default)]
    temporal_coverage_end: Option<String>,
}

impl DatasetEntry {
    fn split(self) -> (Dataset, PackageDetail) {
        let detail = PackageDetail {
            id: self.id.clone(),
            name: self.name.clone(),
            title: self.title,
            url: self.url,
            notes: self.notes,
            license_title: self.license_title,
            tags: self.tags,
            agents: self.agents,
            contacts: self.contacts,
            geographic_coverage: self.geographic_coverage,
            temporal_coverage_begin: self.temporal_coverage_begin,
            temporal_coverage_end: self.temporal_coverage_end,
        };
        let dataset = Dataset {
            id: self.id,
            name: self.name,
            metadata_created: self.metadata_created,
            revision_timestamp: self.revision_timestamp,
            extras: self.extras,
        };
        (dataset, detail)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    datasets: Vec<DatasetEntry>,
    #[serde(default)]
    groups: Vec<Group>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// # Examples
    /// ```
    /// use catalog_oaipmh::catalog::InMemoryCatalog;
    ///
    /// let catalog = InMemoryCatalog::from_json(r#"{
    ///     "datasets": [{"id": "d1", "name": "rain", "revision_timestamp": "2020-01-01T00:00:00Z"}],
    ///     "groups": [{"id": "g1", "name": "climate", "packages": ["d1"]}]
    /// }"#).unwrap();
    /// assert_eq!(catalog.dataset_count(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for entry in file.datasets {
            let (dataset, detail) = entry.split();
            catalog.insert_dataset(dataset, detail);
        }
        for group in file.groups {
            catalog.insert_group(group);
        }
        Ok(catalog)
    }

    /// Load a catalog file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            datasets = catalog.datasets.len(),
            groups = catalog.groups.len(),
            "loaded catalog file"
        );
        Ok(catalog)
    }

    /// Add a dataset, replacing an earlier one with the same id.
    pub fn insert_dataset(&mut self, dataset: Dataset, detail: PackageDetail) {
        self.details.insert(dataset.id.clone(), detail);
        match self.datasets.iter_mut().find(|d| d.id == dataset.id) {
            Some(existing) => *existing = dataset,
            None => self.datasets.push(dataset),
        }
    }

    /// Add a group, replacing an earlier one with the same name.
    pub fn insert_group(&mut self, group: Group) {
        match self.groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: Dataset, detail: PackageDetail) -> Self {
        self.insert_dataset(dataset, detail);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.insert_group(group);
        self
    }

    #[must_use]
    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>> {
        Ok(self.datasets.iter().find(|d| d.id == id).cloned())
    }

    async fn show_dataset(&self, id: &str) -> Result<PackageDetail> {
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| OaiError::IdDoesNotExist(id.to_string()))
    }

    async fn query_datasets(&self, query: &DatasetQuery) -> Result<Vec<Dataset>> {
        Ok(self
            .datasets
            .iter()
            .filter(|d| query.matches(d))
            .cloned()
            .collect())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.clone())
    }
}
