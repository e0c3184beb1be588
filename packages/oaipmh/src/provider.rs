//! OAI-PMH verbs answered from the catalog.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, DatasetQuery, RevisionFilter};
use crate::config::{
    earliest_datestamp, RepositoryConfig, COMPRESSION, DELETED_RECORD, GRANULARITY,
    PROTOCOL_VERSION,
};
use crate::error::{OaiError, Result};
use crate::metadata::build_metadata;
use crate::models::Dataset;
use crate::types::{
    Header, Identify, MetadataFormat, MetadataPrefix, Record, SetSpec, SUPPORTED_FORMATS,
};

/// Arguments shared by ListIdentifiers and ListRecords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub prefix: MetadataPrefix,
    /// Group name to restrict to.
    pub set: Option<String>,
    /// Keep only the first `cursor` results when positive.
    pub cursor: Option<usize>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Accepted for interface compatibility; results are not batched here.
    pub batch_size: Option<usize>,
}

impl ListQuery {
    #[must_use]
    pub fn new(prefix: MetadataPrefix) -> Self {
        Self {
            prefix,
            set: None,
            cursor: None,
            from: None,
            until: None,
            batch_size: None,
        }
    }

    #[must_use]
    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

/// Truncate to the first `cursor` entries when a positive cursor is given.
fn cap<T>(mut items: Vec<T>, cursor: Option<usize>) -> Vec<T> {
    if let Some(n) = cursor.filter(|n| *n > 0) {
        items.truncate(n);
    }
    items
}

fn header_for(dataset: &Dataset) -> Header {
    Header {
        identifier: dataset.id.clone(),
        datestamp: dataset.metadata_created,
        set_specs: vec![dataset.name.clone()],
        deleted: false,
    }
}

/// The OAI-PMH repository backed by a catalog.
pub struct CatalogServer {
    config: RepositoryConfig,
    catalog: Arc<dyn Catalog>,
}

impl CatalogServer {
    pub fn new(config: RepositoryConfig, catalog: Arc<dyn Catalog>) -> Self {
        Self { config, catalog }
    }

    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Describe the repository.
    #[must_use]
    pub fn identify(&self) -> Identify {
        Identify {
            repository_name: self.config.repository_name().to_string(),
            base_url: self.config.base_url(),
            protocol_version: PROTOCOL_VERSION,
            admin_emails: self.config.admin_email.iter().cloned().collect(),
            earliest_datestamp: earliest_datestamp(),
            deleted_record: DELETED_RECORD,
            granularity: GRANULARITY,
            compression: COMPRESSION.to_vec(),
        }
    }

    /// Metadata formats this repository disseminates.
    #[must_use]
    pub fn list_metadata_formats(&self) -> Vec<MetadataFormat> {
        SUPPORTED_FORMATS.to_vec()
    }

    /// Whether a dataset with this id exists.
    pub async fn record_exists(&self, identifier: &str) -> Result<bool> {
        Ok(self.catalog.get_dataset(identifier).await?.is_some())
    }

    /// Fetch one record by dataset id.
    ///
    /// Fails with [`OaiError::IdDoesNotExist`] for an unknown id.
    pub async fn get_record(&self, prefix: MetadataPrefix, identifier: &str) -> Result<Record> {
        let dataset = self
            .catalog
            .get_dataset(identifier)
            .await?
            .ok_or_else(|| OaiError::IdDoesNotExist(identifier.to_string()))?;

        tracing::debug!(identifier, %prefix, "record requested");
        self.record_for_dataset(&dataset).await
    }

    /// Headers of the datasets matching the query.
    pub async fn list_identifiers(&self, query: &ListQuery) -> Result<Vec<Header>> {
        let datasets = cap(self.select_datasets(query).await?, query.cursor);
        Ok(datasets.iter().map(header_for).collect())
    }

    /// Full records of the datasets matching the query.
    pub async fn list_records(&self, query: &ListQuery) -> Result<Vec<Record>> {
        let datasets = cap(self.select_datasets(query).await?, query.cursor);

        let mut records = Vec::with_capacity(datasets.len());
        for dataset in &datasets {
            records.push(self.record_for_dataset(dataset).await?);
        }
        Ok(records)
    }

    /// One set per catalog group.
    pub async fn list_sets(
        &self,
        cursor: Option<usize>,
        _batch_size: Option<usize>,
    ) -> Result<Vec<SetSpec>> {
        let groups = cap(self.catalog.list_groups().await?, cursor);
        Ok(groups
            .into_iter()
            .map(|g| SetSpec {
                spec: g.id,
                name: g.name,
                description: g.description,
            })
            .collect())
    }

    /// Datasets matching the set and date bounds of a query, uncapped.
    ///
    /// An unknown set yields no datasets rather than an error.
    pub async fn select_datasets(&self, query: &ListQuery) -> Result<Vec<Dataset>> {
        let revision = RevisionFilter::from_bounds(query.from, query.until);
        let mut selection = DatasetQuery::all().with_revision(revision);

        if let Some(ref set) = query.set {
            match self.catalog.get_group_by_name(set).await? {
                Some(group) => selection = selection.in_group(group),
                None => {
                    tracing::debug!(set = %set, "unknown set, returning no datasets");
                    return Ok(Vec::new());
                }
            }
        }

        self.catalog.query_datasets(&selection).await
    }

    /// Build the record for a dataset from its full representation.
    pub async fn record_for_dataset(&self, dataset: &Dataset) -> Result<Record> {
        let package = self.catalog.show_dataset(&dataset.id).await?;
        let metadata = build_metadata(dataset, &package, &self.config);

        Ok(Record {
            header: header_for(dataset),
            metadata,
            about: None,
        })
    }
}
