use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    application::{catalog::CatalogService, error::HttpError},
    domain::catalog::CatalogKind,
};

use super::{
    middleware::{log_responses, set_request_context},
    public::health,
};

/// State of the operator-only listener.
#[derive(Clone)]
pub struct AdminState {
    pub catalog: CatalogService,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_health", get(health))
        .route("/catalog/invalidate", post(invalidate_catalog))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InvalidateQuery {
    kind: Option<String>,
}

async fn invalidate_catalog(
    State(state): State<AdminState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::admin::invalidate_catalog";

    let kind = match query.kind.as_deref() {
        None | Some("") | Some("all") => None,
        Some(value) => Some(value.parse::<CatalogKind>().map_err(|reason| {
            HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Unknown catalog kind",
                reason,
            )
        })?),
    };

    state.catalog.invalidate(kind);
    info!(
        target = SOURCE,
        catalog = kind.map(CatalogKind::as_str).unwrap_or("all"),
        "catalog invalidated"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}
