use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use super::HttpState;

pub(super) fn build_public_routes() -> Router<HttpState> {
    Router::new()
        .route("/_health", get(health))
        .route("/slides/{*path}", get(serve_slide_asset))
        .route("/infographics/{*path}", get(serve_infographic_asset))
        .route("/outputs/{*path}", get(serve_output))
}

pub(super) async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn serve_slide_asset(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    state
        .slides_assets
        .serve(&path, "infra::http::public::serve_slide_asset")
        .await
}

async fn serve_infographic_asset(
    State(state): State<HttpState>,
    Path(path): Path<String>,
) -> Response {
    state
        .infographics_assets
        .serve(&path, "infra::http::public::serve_infographic_asset")
        .await
}

async fn serve_output(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    state
        .outputs
        .serve(&path, "infra::http::public::serve_output")
        .await
}
