//! Read-only access to the dataset catalog.
//!
//! The provider only talks to the catalog through the [`Catalog`] trait, so
//! tests and local serving run against [`InMemoryCatalog`] while deployments
//! read the PostgreSQL catalog through [`PgCatalog`].

mod memory;
mod postgres;

pub use memory::InMemoryCatalog;
pub use postgres::PgCatalog;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Dataset, Group, PackageDetail};

/// Restriction on a dataset's revision timestamp.
///
/// Single bounds are exclusive, a pair of bounds is an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionFilter {
    Any,
    /// Strictly after the bound.
    After(DateTime<Utc>),
    /// Strictly before the bound.
    Before(DateTime<Utc>),
    /// Within `[from, until]`.
    Between(DateTime<Utc>, DateTime<Utc>),
}

impl RevisionFilter {
    /// Build the filter for optional `from`/`until` bounds.
    ///
    /// # Examples
    /// ```
    /// use catalog_oaipmh::catalog::RevisionFilter;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let from = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    /// assert_eq!(RevisionFilter::from_bounds(None, None), RevisionFilter::Any);
    /// assert_eq!(
    ///     RevisionFilter::from_bounds(Some(from), None),
    ///     RevisionFilter::After(from)
    /// );
    /// ```
    #[must_use]
    pub fn from_bounds(from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        match (from, until) {
            (None, None) => Self::Any,
            (Some(from), None) => Self::After(from),
            (None, Some(until)) => Self::Before(until),
            (Some(from), Some(until)) => Self::Between(from, until),
        }
    }

    #[must_use]
    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        match *self {
            Self::Any => true,
            Self::After(from) => timestamp > from,
            Self::Before(until) => timestamp < until,
            Self::Between(from, until) => from <= timestamp && timestamp <= until,
        }
    }
}

/// Selection of datasets for the list verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    /// Restrict to the members of this group.
    pub group: Option<Group>,
    pub revision: RevisionFilter,
}

impl DatasetQuery {
    #[must_use]
    pub fn all() -> Self {
        Self {
            group: None,
            revision: RevisionFilter::Any,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn with_revision(mut self, revision: RevisionFilter) -> Self {
        self.revision = revision;
        self
    }

    /// Whether a dataset satisfies both the group and the revision filter.
    #[must_use]
    pub fn matches(&self, dataset: &Dataset) -> bool {
        let in_group = self
            .group
            .as_ref()
            .map_or(true, |g| g.contains(&dataset.id));
        in_group && self.revision.matches(dataset.revision_timestamp)
    }
}

/// Catalog queries the provider depends on.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a dataset by id.
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>>;

    /// Full representation of a dataset.
    ///
    /// Fails with `IdDoesNotExist` when the id is unknown.
    async fn show_dataset(&self, id: &str) -> Result<PackageDetail>;

    /// Datasets matching the query, in catalog order.
    async fn query_datasets(&self, query: &DatasetQuery) -> Result<Vec<Dataset>>;

    /// Look up a group by name.
    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>>;

    /// All groups, in catalog order.
    async fn list_groups(&self) -> Result<Vec<Group>>;
}
