//! HTTP routes for the OAI-PMH endpoint.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::protocol;
use crate::provider::CatalogServer;

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Build the router: the OAI-PMH endpoint at the configured path plus `/health`.
pub fn router(server: Arc<CatalogServer>) -> Router {
    let oai_path = server.config().oai_path.clone();

    Router::new()
        .route(&oai_path, get(oai_get).post(oai_post))
        .route("/health", get(health))
        .with_state(server)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

async fn oai_get(
    State(server): State<Arc<CatalogServer>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    respond(&server, &params).await
}

async fn oai_post(
    State(server): State<Arc<CatalogServer>>,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    respond(&server, &params).await
}

async fn respond(server: &CatalogServer, params: &[(String, String)]) -> Response {
    match protocol::handle(server, params).await {
        Ok(body) => ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to answer OAI-PMH request");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
