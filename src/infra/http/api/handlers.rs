use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use layoutgen_api_types::{CatalogListItem, GenerateResponse, InfographicDetail, SlideDetail};
use serde_json::Value;

use crate::{
    domain::{catalog::CatalogKind, validation::ValidationError},
    infra::http::HttpState,
};

use super::error::ApiError;

pub(super) async fn list_slides(
    State(state): State<HttpState>,
) -> Result<Json<Vec<CatalogListItem>>, ApiError> {
    list(&state, CatalogKind::Slides, "infra::http::api::list_slides").await
}

pub(super) async fn list_infographics(
    State(state): State<HttpState>,
) -> Result<Json<Vec<CatalogListItem>>, ApiError> {
    list(
        &state,
        CatalogKind::Infographics,
        "infra::http::api::list_infographics",
    )
    .await
}

async fn list(
    state: &HttpState,
    kind: CatalogKind,
    source: &'static str,
) -> Result<Json<Vec<CatalogListItem>>, ApiError> {
    state
        .catalog
        .list(kind)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_catalog(source, kind, err))
}

pub(super) async fn slide_detail(
    State(state): State<HttpState>,
    Path(index): Path<String>,
) -> Result<Json<SlideDetail>, ApiError> {
    state
        .catalog
        .slide_detail(&index)
        .await
        .map(Json)
        .map_err(|err| {
            ApiError::from_catalog("infra::http::api::slide_detail", CatalogKind::Slides, err)
        })
}

pub(super) async fn infographic_detail(
    State(state): State<HttpState>,
    Path(index): Path<String>,
) -> Result<Json<InfographicDetail>, ApiError> {
    state
        .catalog
        .infographic_detail(&index)
        .await
        .map(Json)
        .map_err(|err| {
            ApiError::from_catalog(
                "infra::http::api::infographic_detail",
                CatalogKind::Infographics,
                err,
            )
        })
}

pub(super) async fn generate(
    State(state): State<HttpState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    const SOURCE: &str = "infra::http::api::generate";

    let payload: Value = serde_json::from_slice(&body).map_err(|err| {
        ApiError::invalid_config(
            SOURCE,
            &ValidationError::single("", format!("malformed JSON: {err}")),
        )
    })?;

    let outcome = state
        .generation
        .generate(&payload)
        .await
        .map_err(|err| ApiError::from_generation(SOURCE, err))?;

    Ok(Json(GenerateResponse {
        index: outcome.index,
        image_url: outcome.urls.image_url,
        bbox_url: outcome.urls.bbox_url,
    }))
}
