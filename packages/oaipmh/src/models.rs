//! Catalog entities as the provider reads them.
//!
//! None of these are created or modified here; the catalog owns them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dataset row: identity, timestamps and free-form extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata_created: Option<DateTime<Utc>>,
    pub revision_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl Dataset {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        revision_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metadata_created: None,
            revision_timestamp,
            extras: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.metadata_created = Some(created);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// Role of an agent attached to a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Author,
    Contributor,
    Distributor,
    Funder,
    Owner,
    #[serde(other)]
    Other,
}

/// A person or organisation attached to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub role: AgentRole,
    #[serde(default)]
    pub name: Option<String>,
}

impl Agent {
    #[must_use]
    pub fn new(role: AgentRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: Some(name.into()),
        }
    }
}

/// A contact point of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A keyword tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub display_name: String,
}

/// Full "show" representation of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub geographic_coverage: Option<String>,
    #[serde(default)]
    pub temporal_coverage_begin: Option<String>,
    #[serde(default)]
    pub temporal_coverage_end: Option<String>,
}

impl PackageDetail {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    fn agents_with_role(&self, role: AgentRole) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(move |a| a.role == role)
    }

    pub fn authors(&self) -> impl Iterator<Item = &Agent> {
        self.agents_with_role(AgentRole::Author)
    }

    pub fn contributors(&self) -> impl Iterator<Item = &Agent> {
        self.agents_with_role(AgentRole::Contributor)
    }

    pub fn distributors(&self) -> impl Iterator<Item = &Agent> {
        self.agents_with_role(AgentRole::Distributor)
    }
}

/// A group of datasets, exposed as an OAI-PMH set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "packages")]
    pub package_ids: BTreeSet<String>,
}

impl Group {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            package_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_package(mut self, id: impl Into<String>) -> Self {
        self.package_ids.insert(id.into());
        self
    }

    #[must_use]
    pub fn contains(&self, dataset_id: &str) -> bool {
        self.package_ids.contains(dataset_id)
    }
}
