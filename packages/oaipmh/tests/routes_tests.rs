mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use catalog_oaipmh::catalog::{Catalog, DatasetQuery};
use catalog_oaipmh::models::{Dataset, Group, PackageDetail};
use catalog_oaipmh::provider::CatalogServer;
use catalog_oaipmh::routes::router;
use catalog_oaipmh::{OaiError, Result};

/// Catalog whose every query fails, as an unreachable database would.
struct UnavailableCatalog;

#[async_trait]
impl Catalog for UnavailableCatalog {
    async fn get_dataset(&self, _id: &str) -> Result<Option<Dataset>> {
        Err(OaiError::Config("catalog unavailable".into()))
    }

    async fn show_dataset(&self, _id: &str) -> Result<PackageDetail> {
        Err(OaiError::Config("catalog unavailable".into()))
    }

    async fn query_datasets(&self, _query: &DatasetQuery) -> Result<Vec<Dataset>> {
        Err(OaiError::Config("catalog unavailable".into()))
    }

    async fn get_group_by_name(&self, _name: &str) -> Result<Option<Group>> {
        Err(OaiError::Config("catalog unavailable".into()))
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Err(OaiError::Config("catalog unavailable".into()))
    }
}

fn app() -> Router {
    router(Arc::new(common::server()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Option<String>, String) {
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_identify_over_get() {
    let (status, content_type, body) = get(app(), "/oai?verb=Identify").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml; charset=utf-8"));
    assert!(body.contains("<repositoryName>Example Open Data</repositoryName>"));
}

#[tokio::test]
async fn test_unknown_id_renders_id_does_not_exist() {
    let (status, _, body) = get(
        app(),
        "/oai?verb=GetRecord&identifier=missing&metadataPrefix=oai_dc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<error code="idDoesNotExist">"#));
}

#[tokio::test]
async fn test_list_records_over_post() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/oai")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("verb=ListRecords&metadataPrefix=oai_dc&set=climate"))
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, content_type, body) = read(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml; charset=utf-8"));
    assert_eq!(body.matches("<record>").count(), 2);
}

#[tokio::test]
async fn test_configured_oai_path() {
    let server = CatalogServer::new(
        common::config().with_oai_path("/harvest"),
        Arc::new(common::fixture_catalog()),
    );
    let app = router(Arc::new(server));

    let (status, _, body) = get(app.clone(), "/harvest?verb=Identify").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<baseURL>https://data.example.org/harvest</baseURL>"));

    let (status, _, _) = get(app, "/oai?verb=Identify").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_fault_is_server_error() {
    let server = CatalogServer::new(common::config(), Arc::new(UnavailableCatalog));
    let app = router(Arc::new(server));

    let (status, _, _) = get(app.clone(), "/oai?verb=ListSets").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Requests that never reach the catalog still succeed.
    let (status, _, body) = get(app, "/oai?verb=Identify").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Identify>"));
}
