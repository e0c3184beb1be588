//! Dublin Core metadata for a dataset.
//!
//! Building a record body happens in three steps:
//!
//! 1. the known fields are computed from the package representation,
//! 2. the dataset's extras are folded in, overwriting known fields on a
//!    duplicate key,
//! 3. a single normalization pass turns every value into a list of strings.

use std::collections::BTreeMap;

use crate::config::RepositoryConfig;
use crate::models::{Dataset, PackageDetail};
use crate::types::Metadata;

/// A field value before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Compose the coverage text from geographic and temporal coverage.
///
/// Returns `None` when neither is present.
///
/// # Examples
/// ```
/// use catalog_oaipmh::metadata::compose_coverage;
///
/// assert_eq!(
///     compose_coverage(Some("Finland"), Some("2000-01-01"), Some("2001-01-01")).as_deref(),
///     Some("Finland; 2000-01-01 - 2001-01-01")
/// );
/// assert_eq!(
///     compose_coverage(None, Some("2000-01-01"), None).as_deref(),
///     Some("2000-01-01 - ")
/// );
/// assert_eq!(compose_coverage(None, None, None), None);
/// ```
#[must_use]
pub fn compose_coverage(
    geographic: Option<&str>,
    begin: Option<&str>,
    end: Option<&str>,
) -> Option<String> {
    let mut coverage = present(geographic).unwrap_or_default().to_string();

    let begin = present(begin);
    let end = present(end);
    if begin.is_some() || end.is_some() {
        if !coverage.is_empty() {
            coverage.push_str("; ");
        }
        coverage.push_str(begin.unwrap_or_default());
        coverage.push_str(" - ");
        coverage.push_str(end.unwrap_or_default());
    }

    (!coverage.is_empty()).then_some(coverage)
}

fn known_fields(
    dataset: &Dataset,
    package: &PackageDetail,
    config: &RepositoryConfig,
) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();

    let title = present(package.title.as_deref()).unwrap_or(&package.name);
    fields.insert("title".into(), FieldValue::One(title.to_string()));

    let creators = package.authors().filter_map(|a| a.name.clone()).collect();
    fields.insert("creator".into(), FieldValue::Many(creators));

    let publishers = package
        .distributors()
        .filter_map(|a| a.name.clone())
        .chain(package.contacts.iter().filter_map(|c| c.name.clone()))
        .collect();
    fields.insert("publisher".into(), FieldValue::Many(publishers));

    let contributors = package
        .contributors()
        .filter_map(|a| a.name.clone())
        .collect();
    fields.insert("contributor".into(), FieldValue::Many(contributors));

    let own_identifier = present(package.url.as_deref()).unwrap_or(&package.id);
    fields.insert(
        "identifier".into(),
        FieldValue::Many(vec![
            config.dataset_url(&package.id),
            own_identifier.to_string(),
        ]),
    );

    fields.insert("type".into(), FieldValue::One("dataset".into()));

    if let Some(notes) = present(package.notes.as_deref()) {
        fields.insert("description".into(), FieldValue::One(notes.to_string()));
    }

    if !package.tags.is_empty() {
        let subjects = package
            .tags
            .iter()
            .map(|t| t.display_name.clone())
            .collect();
        fields.insert("subject".into(), FieldValue::Many(subjects));
    }

    if let Some(created) = dataset.metadata_created {
        fields.insert(
            "date".into(),
            FieldValue::One(created.format("%Y-%m-%d").to_string()),
        );
    }

    if let Some(license) = present(package.license_title.as_deref()) {
        fields.insert("rights".into(), FieldValue::One(license.to_string()));
    }

    if let Some(coverage) = compose_coverage(
        package.geographic_coverage.as_deref(),
        package.temporal_coverage_begin.as_deref(),
        package.temporal_coverage_end.as_deref(),
    ) {
        fields.insert("coverage".into(), FieldValue::One(coverage));
    }

    fields
}

/// Build the record body for a dataset.
#[must_use]
pub fn build_metadata(
    dataset: &Dataset,
    package: &PackageDetail,
    config: &RepositoryConfig,
) -> Metadata {
    let mut fields = known_fields(dataset, package, config);

    // Extras win over computed fields.
    for (key, value) in &dataset.extras {
        fields.insert(key.clone(), FieldValue::One(value.clone()));
    }

    let normalized = fields
        .into_iter()
        .map(|(key, value)| (key, value.into_values()))
        .collect();

    Metadata::new(normalized)
}
