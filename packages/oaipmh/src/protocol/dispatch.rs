//! Request dispatch: validated request → provider → XML response.

use chrono::{DateTime, Utc};

use super::request::{OaiRequest, Selection, Verb};
use super::resumption::{self, paginate, Page};
use super::xml::{self, Envelope};
use crate::error::{OaiError, Result};
use crate::provider::CatalogServer;
use crate::types::Record;

/// Answer one OAI-PMH request.
///
/// Protocol errors are rendered as OAI-PMH error responses. Catalog faults
/// are returned as `Err`.
pub async fn handle(server: &CatalogServer, params: &[(String, String)]) -> Result<String> {
    handle_at(server, params, Utc::now()).await
}

/// Like [`handle`], with a fixed response date.
pub async fn handle_at(
    server: &CatalogServer,
    params: &[(String, String)],
    now: DateTime<Utc>,
) -> Result<String> {
    let base_url = server.config().base_url();

    let request = match OaiRequest::from_params(params) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!(code = e.code().unwrap_or_default(), error = %e, "rejected request");
            // Arguments are only echoed when they were syntactically valid.
            let request_args = match e {
                OaiError::BadVerb(_) | OaiError::BadArgument(_) => None,
                _ => Some(params),
            };
            let envelope = Envelope {
                base_url: &base_url,
                response_date: now,
                request_args,
            };
            return Ok(xml::render_error(&envelope, &e));
        }
    };

    let envelope = Envelope {
        base_url: &base_url,
        response_date: now,
        request_args: Some(params),
    };

    tracing::info!(verb = %request.verb(), "handling request");
    match respond(server, &request, &envelope).await {
        Ok(body) => Ok(body),
        Err(e) if e.is_protocol_error() => {
            tracing::info!(verb = %request.verb(), code = e.code().unwrap_or_default(), "protocol error");
            Ok(xml::render_error(&envelope, &e))
        }
        Err(e) => {
            tracing::error!(verb = %request.verb(), error = %e, "catalog fault");
            Err(e)
        }
    }
}

async fn respond(
    server: &CatalogServer,
    request: &OaiRequest,
    envelope: &Envelope<'_>,
) -> Result<String> {
    let batch_size = server.config().batch_size;

    match request {
        OaiRequest::Identify => Ok(xml::render_identify(envelope, &server.identify())),

        OaiRequest::ListMetadataFormats { identifier } => {
            if let Some(id) = identifier {
                if !server.record_exists(id).await? {
                    return Err(OaiError::IdDoesNotExist(id.clone()));
                }
            }
            Ok(xml::render_metadata_formats(
                envelope,
                &server.list_metadata_formats(),
            ))
        }

        OaiRequest::GetRecord { identifier, prefix } => {
            let record = server.get_record(*prefix, identifier).await?;
            Ok(xml::render_record(envelope, *prefix, &record))
        }

        OaiRequest::ListIdentifiers(selection) => {
            let headers = server.list_identifiers(&selection.to_list_query()).await?;
            if headers.is_empty() {
                return Err(OaiError::NoRecordsMatch);
            }
            let page = paginate(headers, selection.offset, batch_size, |next| {
                resumption::encode_selection(Verb::ListIdentifiers, selection, next)
            })?;
            Ok(xml::render_identifiers(envelope, &page))
        }

        OaiRequest::ListRecords(selection) => {
            let page = list_records_page(server, selection, batch_size).await?;
            Ok(xml::render_records(envelope, selection.prefix, &page))
        }

        OaiRequest::ListSets { offset } => {
            let sets = server.list_sets(None, Some(batch_size)).await?;
            if sets.is_empty() {
                return Err(OaiError::NoSetHierarchy);
            }
            let page = paginate(sets, *offset, batch_size, resumption::encode_sets)?;
            Ok(xml::render_sets(envelope, &page))
        }
    }
}

/// Records are only built for the datasets on the requested page.
async fn list_records_page(
    server: &CatalogServer,
    selection: &Selection,
    batch_size: usize,
) -> Result<Page<Record>> {
    let datasets = server.select_datasets(&selection.to_list_query()).await?;
    if datasets.is_empty() {
        return Err(OaiError::NoRecordsMatch);
    }

    let page = paginate(datasets, selection.offset, batch_size, |next| {
        resumption::encode_selection(Verb::ListRecords, selection, next)
    })?;

    let mut records = Vec::with_capacity(page.items.len());
    for dataset in &page.items {
        records.push(server.record_for_dataset(dataset).await?);
    }

    Ok(Page {
        items: records,
        resumption: page.resumption,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::config::RepositoryConfig;
    use crate::models::{Dataset, Group, PackageDetail};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn server(batch_size: usize) -> CatalogServer {
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut catalog = InMemoryCatalog::new();
        for i in 0..5 {
            let (id, name) = (format!("d{i}"), format!("set-{i}"));
            catalog.insert_dataset(
                Dataset::new(id.clone(), name.clone(), created),
                PackageDetail::new(id, name),
            );
        }
        catalog.insert_group(
            Group::new("g1", "climate")
                .with_description("Weather and climate series")
                .with_package("d0"),
        );

        let config = RepositoryConfig::new("https://data.example.org").with_batch_size(batch_size);
        CatalogServer::new(config, Arc::new(catalog))
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn run(server: &CatalogServer, pairs: &[(&str, &str)]) -> String {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        handle_at(server, &params(pairs), now).await.unwrap()
    }

    #[tokio::test]
    async fn test_bad_verb_has_bare_request_element() {
        let xml = run(&server(10), &[("verb", "Harvest")]).await;
        assert!(xml.contains(r#"<error code="badVerb">"#));
        assert!(xml.contains("<request>https://data.example.org/oai</request>"));
    }

    #[tokio::test]
    async fn test_unknown_set_renders_no_records_match() {
        let xml = run(
            &server(10),
            &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("set", "nope")],
        )
        .await;
        assert!(xml.contains(r#"<error code="noRecordsMatch">"#));
    }

    #[tokio::test]
    async fn test_list_identifiers_pages_with_token() {
        let server = server(2);
        let xml = run(&server, &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]).await;
        assert_eq!(xml.matches("<header>").count(), 2);
        assert!(xml.contains(r#"completeListSize="5" cursor="0""#));

        let token = resumption::encode_selection(
            Verb::ListIdentifiers,
            &Selection::new(crate::types::MetadataPrefix::OaiDc),
            4,
        );
        let xml = run(&server, &[("verb", "ListIdentifiers"), ("resumptionToken", token.as_str())]).await;
        assert_eq!(xml.matches("<header>").count(), 1);
        assert!(xml.contains(r#"<resumptionToken completeListSize="5" cursor="4"/>"#));
    }

    #[tokio::test]
    async fn test_unbounded_batch_size_resumes() {
        let server = server(usize::MAX);
        let token = resumption::encode_selection(
            Verb::ListIdentifiers,
            &Selection::new(crate::types::MetadataPrefix::OaiDc),
            1,
        );
        let xml = run(&server, &[("verb", "ListIdentifiers"), ("resumptionToken", token.as_str())]).await;
        assert_eq!(xml.matches("<header>").count(), 4);
        assert!(xml.contains(r#"<resumptionToken completeListSize="5" cursor="1"/>"#));
    }

    #[tokio::test]
    async fn test_list_sets_with_description() {
        let xml = run(&server(10), &[("verb", "ListSets")]).await;
        assert!(xml.contains("<setSpec>g1</setSpec>"));
        assert!(xml.contains("<dc:description>Weather and climate series</dc:description>"));
    }

    #[tokio::test]
    async fn test_list_metadata_formats_for_unknown_id() {
        let xml = run(&server(10), &[("verb", "ListMetadataFormats"), ("identifier", "missing")]).await;
        assert!(xml.contains(r#"<error code="idDoesNotExist">"#));
    }
}
