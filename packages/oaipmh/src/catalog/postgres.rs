//! PostgreSQL-backed catalog.
//!
//! Reads the `package`, `package_extra`, `"group"` and `member` tables (see
//! `schema/catalog.sql`). The provider never writes to them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{Catalog, DatasetQuery, RevisionFilter};
use crate::config::DatabaseConfig;
use crate::error::{OaiError, Result};
use crate::models::{Agent, Contact, Dataset, Group, PackageDetail, Tag};

const DATASET_COLUMNS: &str = "p.id, p.name, p.metadata_created, p.revision_timestamp, \
     COALESCE((SELECT jsonb_object_agg(e.key, e.value) FROM package_extra e \
     WHERE e.package_id = p.id), '{}'::jsonb) AS extras";

const GROUP_COLUMNS: &str = "g.id, g.name, g.description, \
     COALESCE(array_agg(m.package_id ORDER BY m.package_id) \
     FILTER (WHERE m.package_id IS NOT NULL), '{}') AS package_ids";

#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: String,
    name: String,
    metadata_created: Option<DateTime<Utc>>,
    revision_timestamp: DateTime<Utc>,
    extras: Json<BTreeMap<String, String>>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            metadata_created: row.metadata_created,
            revision_timestamp: row.revision_timestamp,
            extras: row.extras.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: String,
    name: String,
    title: Option<String>,
    url: Option<String>,
    notes: Option<String>,
    license_title: Option<String>,
    tags: Json<Vec<Tag>>,
    agents: Json<Vec<Agent>>,
    contacts: Json<Vec<Contact>>,
    geographic_coverage: Option<String>,
    temporal_coverage_begin: Option<String>,
    temporal_coverage_end: Option<String>,
}

impl From<PackageRow> for PackageDetail {
    fn from(row: PackageRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            title: row.title,
            url: row.url,
            notes: row.notes,
            license_title: row.license_title,
            tags: row.tags.0,
            agents: row.agents.0,
            contacts: row.contacts.0,
            geographic_coverage: row.geographic_coverage,
            temporal_coverage_begin: row.temporal_coverage_begin,
            temporal_coverage_end: row.temporal_coverage_end,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    name: String,
    description: Option<String>,
    package_ids: Vec<String>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            package_ids: row.package_ids.into_iter().collect(),
        }
    }
}

/// Render a revision filter as a SQL predicate on `p.revision_timestamp`.
///
/// Placeholders are numbered from `first_index`; the returned timestamps
/// must be bound in order.
fn revision_clause(
    filter: &RevisionFilter,
    first_index: usize,
) -> (Option<String>, Vec<DateTime<Utc>>) {
    let i = first_index;
    match *filter {
        RevisionFilter::Any => (None, Vec::new()),
        RevisionFilter::After(from) => (Some(format!("p.revision_timestamp > ${i}")), vec![from]),
        RevisionFilter::Before(until) => {
            (Some(format!("p.revision_timestamp < ${i}")), vec![until])
        }
        RevisionFilter::Between(from, until) => (
            Some(format!(
                "p.revision_timestamp BETWEEN ${i} AND ${}",
                i + 1
            )),
            vec![from, until],
        ),
    }
}

/// Catalog reading from a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "connected to catalog database");
        Ok(Self::new(pool))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    #[tracing::instrument(skip(self))]
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>> {
        let sql = format!("SELECT {DATASET_COLUMNS} FROM package p WHERE p.id = $1");
        let row = sqlx::query_as::<_, DatasetRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Dataset::from))
    }

    #[tracing::instrument(skip(self))]
    async fn show_dataset(&self, id: &str) -> Result<PackageDetail> {
        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, name, title, url, notes, license_title, tags, agents, contacts,
                   geographic_coverage, temporal_coverage_begin, temporal_coverage_end
            FROM package
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OaiError::IdDoesNotExist(id.to_string()))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self, query), fields(group = query.group.as_ref().map(|g| g.name.as_str()), revision = ?query.revision))]
    async fn query_datasets(&self, query: &DatasetQuery) -> Result<Vec<Dataset>> {
        let mut where_clauses = Vec::new();
        let mut bind_index: usize = 1;

        if query.group.is_some() {
            where_clauses.push(format!(
                "EXISTS (SELECT 1 FROM member m WHERE m.package_id = p.id AND m.group_id = ${bind_index})"
            ));
            bind_index += 1;
        }

        let (revision_sql, bounds) = revision_clause(&query.revision, bind_index);
        if let Some(clause) = revision_sql {
            where_clauses.push(clause);
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let sql = format!("SELECT {DATASET_COLUMNS} FROM package p {where_sql} ORDER BY p.name");

        let mut data_query = sqlx::query_as::<_, DatasetRow>(&sql);
        if let Some(ref group) = query.group {
            data_query = data_query.bind(&group.id);
        }
        for bound in bounds {
            data_query = data_query.bind(bound);
        }

        let rows = data_query.fetch_all(&self.pool).await?;
        tracing::debug!(count = rows.len(), "datasets queried");
        Ok(rows.into_iter().map(Dataset::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM \"group\" g \
             LEFT JOIN member m ON m.group_id = g.id \
             WHERE g.name = $1 GROUP BY g.id"
        );
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Group::from))
    }

    #[tracing::instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM \"group\" g \
             LEFT JOIN member m ON m.group_id = g.id \
             GROUP BY g.id ORDER BY g.name"
        );
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }
}
