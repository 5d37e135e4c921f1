//! JSON API consumed by the layout editor.

pub mod error;
mod handlers;

use axum::{
    Router,
    routing::{get, post},
};

use super::HttpState;

pub fn build_api_router() -> Router<HttpState> {
    Router::new()
        .route("/api/slides", get(handlers::list_slides))
        .route("/api/slides/{index}", get(handlers::slide_detail))
        .route("/api/infographics", get(handlers::list_infographics))
        .route("/api/infographics/{index}", get(handlers::infographic_detail))
        .route("/api/generate", post(handlers::generate))
}
