//! Configuration constants and repository settings.

use chrono::NaiveDate;

use crate::error::{OaiError, Result};

/// OAI-PMH protocol version implemented by this provider.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Repository name used when no site title is configured.
pub const DEFAULT_REPOSITORY_NAME: &str = "repository";

/// Deleted record policy advertised in Identify.
pub const DELETED_RECORD: &str = "no";

/// Datestamp granularity advertised in Identify.
pub const GRANULARITY: &str = "YYYY-MM-DD";

/// Supported response compressions.
pub const COMPRESSION: &[&str] = &["identity"];

/// Path of the OAI-PMH endpoint below the site URL.
pub const DEFAULT_OAI_PATH: &str = "/oai";

/// Path prefix of the public dataset page.
pub const DATASET_PATH: &str = "/dataset";

/// Default number of entries per ListIdentifiers/ListRecords/ListSets page.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default site URL for local development.
pub const DEFAULT_SITE_URL: &str = "http://localhost:8000";

/// Earliest datestamp advertised in Identify.
#[must_use]
pub fn earliest_datestamp() -> NaiveDate {
    NaiveDate::from_ymd_opt(2004, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Site-level settings the provider reads.
///
/// Passed to the provider once at construction; nothing reads the
/// environment after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub site_title: Option<String>,
    pub site_url: String,
    pub admin_email: Option<String>,
    pub oai_path: String,
    pub batch_size: usize,
}

impl RepositoryConfig {
    pub fn new(site_url: impl Into<String>) -> Self {
        let site_url: String = site_url.into();
        Self {
            site_title: None,
            site_url: site_url.trim_end_matches('/').to_string(),
            admin_email: None,
            oai_path: DEFAULT_OAI_PATH.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Load settings from `SITE_URL`, `SITE_TITLE`, `ADMIN_EMAIL`,
    /// `OAI_PATH` and `OAI_BATCH_SIZE`.
    pub fn from_env() -> Self {
        let site_url = std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());

        let mut config = Self::new(site_url);

        if let Some(title) = non_empty_var("SITE_TITLE") {
            config = config.with_site_title(title);
        }
        if let Some(email) = non_empty_var("ADMIN_EMAIL") {
            config = config.with_admin_email(email);
        }
        if let Some(path) = non_empty_var("OAI_PATH") {
            config = config.with_oai_path(path);
        }

        let batch_size = std::env::var("OAI_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        config.with_batch_size(batch_size)
    }

    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    pub fn with_oai_path(mut self, path: impl Into<String>) -> Self {
        let path: String = path.into();
        self.oai_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Repository name, falling back to [`DEFAULT_REPOSITORY_NAME`].
    #[must_use]
    pub fn repository_name(&self) -> &str {
        self.site_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_REPOSITORY_NAME)
    }

    /// Absolute URL of the OAI-PMH endpoint.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{}", self.site_url, self.oai_path)
    }

    /// Absolute URL of the public page of a dataset.
    ///
    /// # Examples
    /// ```
    /// use catalog_oaipmh::config::RepositoryConfig;
    ///
    /// let config = RepositoryConfig::new("https://data.example.org/");
    /// assert_eq!(
    ///     config.dataset_url("abc"),
    ///     "https://data.example.org/dataset/abc"
    /// );
    /// ```
    #[must_use]
    pub fn dataset_url(&self, id: &str) -> String {
        format!("{}{DATASET_PATH}/{id}", self.site_url)
    }
}

/// Connection settings for the PostgreSQL catalog.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| OaiError::Config("DATABASE_URL not set".into()))?;

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_name_default() {
        let config = RepositoryConfig::new("http://localhost:8000");
        assert_eq!(config.repository_name(), "repository");

        let config = config.with_site_title("");
        assert_eq!(config.repository_name(), "repository");
    }

    #[test]
    fn test_repository_name_from_title() {
        let config = RepositoryConfig::new("http://localhost:8000").with_site_title("Open Data");
        assert_eq!(config.repository_name(), "Open Data");
    }

    #[test]
    fn test_base_url() {
        let config = RepositoryConfig::new("https://data.example.org/");
        assert_eq!(config.base_url(), "https://data.example.org/oai");

        let config = config.with_oai_path("harvest/oai");
        assert_eq!(config.base_url(), "https://data.example.org/harvest/oai");
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        let config = RepositoryConfig::new("http://localhost").with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_earliest_datestamp() {
        assert_eq!(earliest_datestamp().to_string(), "2004-01-01");
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::new("postgres://localhost/catalog").with_max_connections(12);
        assert_eq!(config.database_url, "postgres://localhost/catalog");
        assert_eq!(config.max_connections, 12);
    }
}
