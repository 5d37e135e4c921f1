//! Layout documents and the geometric rule that classifies them.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use layoutgen_api_types::{Layer, LayoutDocument, Point};

/// Category marker of the layer that spans the document canvas.
pub const BASE_CATEGORY: &str = "base";
/// Category marker of layers that must carry rendered text.
pub const TEXT_CATEGORY: &str = "text";

/// Canvas every slide template is authored on.
pub const SLIDE_CANVAS: Rect = Rect {
    left: 0,
    top: 0,
    right: 1536,
    bottom: 864,
};

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rect {
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self {
            left: top_left[0],
            top: top_left[1],
            right: bottom_right[0],
            bottom: bottom_right[1],
        }
    }

    pub fn of_layer(layer: &Layer) -> Self {
        Self::from_corners(layer.top_left, layer.bottom_right)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Which trained checkpoint the renderer must load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationCategory {
    Slide,
    Infographic,
}

impl GenerationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationCategory::Slide => "slide",
            GenerationCategory::Infographic => "infographic",
        }
    }
}

impl fmt::Display for GenerationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First layer marked as the base layer, if any.
pub fn base_layer(doc: &LayoutDocument) -> Option<&Layer> {
    doc.layers_all
        .iter()
        .find(|layer| layer.category == BASE_CATEGORY)
}

/// Classify a document from its base layer geometry. Nothing is memoised on
/// the document; edited base layers reclassify on the next call.
pub fn classify(doc: &LayoutDocument) -> Option<GenerationCategory> {
    let base = base_layer(doc)?;
    if Rect::of_layer(base) == SLIDE_CANVAS {
        Some(GenerationCategory::Slide)
    } else {
        Some(GenerationCategory::Infographic)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("no base layer supplied for document `{index}`")]
    MissingBaseLayer { index: String },
    #[error("batch mixes {first} and {second} documents; one render takes one category")]
    MixedBatch {
        first: GenerationCategory,
        second: GenerationCategory,
    },
    #[error("batch contains no documents")]
    EmptyBatch,
}

/// Classify a batch; every document must resolve to the same category.
pub fn classify_batch(docs: &[LayoutDocument]) -> Result<GenerationCategory, ClassificationError> {
    let mut resolved: Option<GenerationCategory> = None;
    for doc in docs {
        let category = classify(doc).ok_or_else(|| ClassificationError::MissingBaseLayer {
            index: doc.index.clone(),
        })?;
        match resolved {
            None => resolved = Some(category),
            Some(first) if first != category => {
                return Err(ClassificationError::MixedBatch {
                    first,
                    second: category,
                });
            }
            Some(_) => {}
        }
    }
    resolved.ok_or(ClassificationError::EmptyBatch)
}
