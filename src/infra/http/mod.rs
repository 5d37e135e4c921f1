mod admin;
pub mod api;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use middleware::REQUEST_ID_HEADER;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};

use crate::{
    application::{catalog::CatalogService, generation::GenerationService},
    infra::assets::AssetDir,
};

use middleware::{log_responses, set_request_context};

/// Shared state of the public listener.
#[derive(Clone)]
pub struct HttpState {
    pub catalog: CatalogService,
    pub generation: GenerationService,
    pub slides_assets: AssetDir,
    pub infographics_assets: AssetDir,
    pub outputs: AssetDir,
    pub max_body_bytes: usize,
}

pub fn build_router(state: HttpState) -> Router {
    let body_limit = state.max_body_bytes;

    api::build_api_router()
        .merge(public::build_public_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
