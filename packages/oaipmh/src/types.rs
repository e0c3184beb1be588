//! Protocol-level structures handed to the OAI-PMH surface.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::OaiError;

/// Metadata formats this repository can disseminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataPrefix {
    /// Simple Dublin Core.
    OaiDc,
    /// Dublin Core elements inside an RDF description.
    Rdf,
}

impl MetadataPrefix {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OaiDc => "oai_dc",
            Self::Rdf => "rdf",
        }
    }
}

impl fmt::Display for MetadataPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataPrefix {
    type Err = OaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oai_dc" => Ok(Self::OaiDc),
            "rdf" => Ok(Self::Rdf),
            other => Err(OaiError::CannotDisseminateFormat(other.to_string())),
        }
    }
}

/// A supported metadata format: (prefix, schema, namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFormat {
    pub prefix: MetadataPrefix,
    pub schema: &'static str,
    pub namespace: &'static str,
}

/// Formats advertised by ListMetadataFormats.
pub const SUPPORTED_FORMATS: [MetadataFormat; 2] = [
    MetadataFormat {
        prefix: MetadataPrefix::OaiDc,
        schema: "http://www.openarchives.org/OAI/2.0/oai_dc.xsd",
        namespace: "http://www.openarchives.org/OAI/2.0/oai_dc/",
    },
    MetadataFormat {
        prefix: MetadataPrefix::Rdf,
        schema: "http://www.openarchives.org/OAI/2.0/rdf.xsd",
        namespace: "http://www.openarchives.org/OAI/2.0/rdf/",
    },
];

/// Response to the Identify verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: &'static str,
    pub admin_emails: Vec<String>,
    pub earliest_datestamp: NaiveDate,
    pub deleted_record: &'static str,
    pub granularity: &'static str,
    pub compression: Vec<&'static str>,
}

/// Record identity as the protocol sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub identifier: String,
    pub datestamp: Option<DateTime<Utc>>,
    pub set_specs: Vec<String>,
    pub deleted: bool,
}

/// Record body: field name to ordered list of values.
///
/// Every field is list-valued; there is no way to store a bare scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    #[must_use]
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A full record: header, metadata and the optional about section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub header: Header,
    pub metadata: Metadata,
    /// Never populated from the catalog.
    pub about: Option<String>,
}

/// A set as listed by ListSets: (spec, name, description).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSpec {
    pub spec: String,
    pub name: String,
    pub description: Option<String>,
}
