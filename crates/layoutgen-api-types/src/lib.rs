//! Wire types shared by the layoutgen server and its command-line client.
//!
//! Field names follow the JSON contract consumed by the browser editor, which
//! mixes snake_case document fields with camelCase response fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A point on the layout canvas, `[x, y]` in pixels.
pub type Point = [i64; 2];

/// One layer of a layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub category: String,
    pub top_left: Point,
    pub bottom_right: Point,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Editor-only toggle; accepted on input and never written back out.
    #[serde(default, skip_serializing)]
    pub active: Option<bool>,
    /// Fields the editor carries through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A slide or infographic described as an ordered stack of layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub index: String,
    pub full_image_caption: String,
    pub layers_all: Vec<Layer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of `GET /api/slides` and `GET /api/infographics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListItem {
    pub index: String,
    pub slide_url: String,
    pub bbox_url: String,
}

/// Response of `GET /api/slides/{index}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDetail {
    pub index: String,
    pub index_json: Value,
    pub next_slide_url: Option<String>,
    pub previous_slide_url: Option<String>,
}

/// Response of `GET /api/infographics/{index}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfographicDetail {
    pub index: String,
    pub index_json: Value,
}

/// Response of a successful `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub index: String,
    pub image_url: String,
    pub bbox_url: String,
}

/// A single schema violation: JSON pointer into the request body plus the
/// expectation that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

/// Error payload returned by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
