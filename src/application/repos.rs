//! Repository traits describing catalog adapters.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::catalog::CatalogKind;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {kind} catalog")]
    Io {
        kind: CatalogKind,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {kind} catalog")]
    Parse {
        kind: CatalogKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} catalog is malformed: {message}")]
    Malformed { kind: CatalogKind, message: String },
}

/// One curated example document, keyed by its normalized index.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub index: String,
    pub document: Value,
}

/// Parsed catalog file in its on-disk order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from the JSON array stored on disk. Entries without a
    /// usable `index` are skipped; the first entry wins on duplicate keys.
    pub fn from_value(kind: CatalogKind, value: Value) -> Result<Self, CatalogError> {
        let Value::Array(items) = value else {
            return Err(CatalogError::Malformed {
                kind,
                message: "expected a top-level array".to_string(),
            });
        };

        let mut catalog = Catalog::default();
        for item in items {
            let Some(index) = item.get("index").and_then(normalize_index) else {
                tracing::warn!(
                    target = "application::repos::catalog",
                    op = "from_value",
                    catalog = %kind,
                    result = "skipped",
                    "Catalog entry has no usable index"
                );
                continue;
            };
            if catalog.positions.contains_key(&index) {
                continue;
            }
            catalog
                .positions
                .insert(index.clone(), catalog.entries.len());
            catalog.entries.push(CatalogEntry {
                index,
                document: item,
            });
        }

        Ok(catalog)
    }

    pub fn parse(kind: CatalogKind, bytes: &[u8]) -> Result<Self, CatalogError> {
        let value = serde_json::from_slice(bytes)
            .map_err(|source| CatalogError::Parse { kind, source })?;
        Self::from_value(kind, value)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: &str) -> Option<&CatalogEntry> {
        self.positions
            .get(index)
            .and_then(|pos| self.entries.get(*pos))
    }

    pub fn contains(&self, index: &str) -> bool {
        self.positions.contains_key(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalog indexes are strings; numeric ones use their decimal form.
pub fn normalize_index(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.is_u64() || number.is_i64() => Some(number.to_string()),
        _ => None,
    }
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn load(&self, kind: CatalogKind) -> Result<Arc<Catalog>, CatalogError>;

    /// Cheap change marker for `kind`; `None` when the backend has none.
    async fn revision(&self, _kind: CatalogKind) -> Result<Option<SystemTime>, CatalogError> {
        Ok(None)
    }

    /// Drop any cached copy of `kind`, or of every catalog when `None`.
    fn invalidate(&self, _kind: Option<CatalogKind>) {}
}
