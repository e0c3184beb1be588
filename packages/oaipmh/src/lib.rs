//! Catalog OAI-PMH - Expose a dataset catalog to metadata harvesters.
//!
//! This crate answers the six OAI-PMH 2.0 verbs from a catalog of datasets
//! and groups. Datasets become records with Dublin Core metadata, groups
//! become sets.
//!
//! # Example
//!
//! ```
//! use catalog_oaipmh::config::RepositoryConfig;
//!
//! let config = RepositoryConfig::new("https://data.example.org").with_site_title("Open Data");
//! assert_eq!(config.base_url(), "https://data.example.org/oai");
//! assert_eq!(config.repository_name(), "Open Data");
//! ```
//!
//! # Architecture
//!
//! The provider is organized into several modules:
//!
//! - [`config`]: Repository settings and protocol constants
//! - [`error`]: Error types and Result alias
//! - [`models`]: Catalog entities (datasets, package details, groups)
//! - [`types`]: Protocol structures (headers, records, sets)
//! - [`catalog`]: Catalog query interface with file and PostgreSQL backends
//! - [`metadata`]: Dublin Core metadata building
//! - [`provider`]: The verbs answered from the catalog
//! - [`protocol`]: Request validation, resumption tokens and XML rendering
//! - [`routes`]: HTTP routes
//! - [`cli`]: Command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod models;
pub mod protocol;
pub mod provider;
pub mod routes;
pub mod types;

// Re-export commonly used items
pub use catalog::{Catalog, InMemoryCatalog, PgCatalog};
pub use config::RepositoryConfig;
pub use error::{OaiError, Result};
pub use provider::{CatalogServer, ListQuery};
pub use types::{Header, Metadata, MetadataPrefix, Record, SetSpec};
