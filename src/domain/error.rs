use serde_json::Value;
use thiserror::Error;

use super::layout::{ClassificationError, GenerationCategory, LayoutDocument, classify_batch};
use super::validation::{ValidationError, validate};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

/// A request body that passed every pure check and is ready to be staged.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub documents: Vec<LayoutDocument>,
    pub category: GenerationCategory,
}

impl PreparedBatch {
    /// Index of the document whose artifacts answer the request.
    pub fn primary_index(&self) -> &str {
        self.documents
            .first()
            .map(|doc| doc.index.as_str())
            .unwrap_or_default()
    }
}

/// Validate then classify a raw request body without touching the filesystem.
pub fn prepare(body: &Value) -> Result<PreparedBatch, DomainError> {
    let documents = validate(body)?;
    let category = classify_batch(&documents)?;
    Ok(PreparedBatch {
        documents,
        category,
    })
}
