//! Disk-backed catalog repository and its read-through cache.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use async_trait::async_trait;
use metrics::counter;
use tokio::fs;
use tracing::debug;

use crate::{
    application::repos::{Catalog, CatalogError, CatalogRepo},
    domain::catalog::CatalogKind,
    infra::{
        lock::{rw_read, rw_write},
        telemetry::{CATALOG_CACHE_HIT_TOTAL, CATALOG_CACHE_MISS_TOTAL},
    },
};

const SOURCE: &str = "infra::catalog";

/// Reads the catalog file from disk on every call, so edits apply without a
/// restart.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    slides_path: PathBuf,
    infographics_path: PathBuf,
}

impl FileCatalog {
    pub fn new(slides_path: PathBuf, infographics_path: PathBuf) -> Self {
        Self {
            slides_path,
            infographics_path,
        }
    }

    pub fn path(&self, kind: CatalogKind) -> &Path {
        match kind {
            CatalogKind::Slides => &self.slides_path,
            CatalogKind::Infographics => &self.infographics_path,
        }
    }
}

#[async_trait]
impl CatalogRepo for FileCatalog {
    async fn load(&self, kind: CatalogKind) -> Result<Arc<Catalog>, CatalogError> {
        let bytes = fs::read(self.path(kind))
            .await
            .map_err(|source| CatalogError::Io { kind, source })?;
        Catalog::parse(kind, &bytes).map(Arc::new)
    }

    async fn revision(&self, kind: CatalogKind) -> Result<Option<SystemTime>, CatalogError> {
        let metadata = fs::metadata(self.path(kind))
            .await
            .map_err(|source| CatalogError::Io { kind, source })?;
        Ok(metadata.modified().ok())
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    revision: Option<SystemTime>,
    catalog: Arc<Catalog>,
}

/// Read-through cache over any catalog repository. An entry is served until it
/// is invalidated or the backend reports a different revision.
pub struct CachedCatalog<R> {
    inner: R,
    entries: RwLock<HashMap<CatalogKind, CachedEntry>>,
}

impl<R> CachedCatalog<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<R: CatalogRepo> CatalogRepo for CachedCatalog<R> {
    async fn load(&self, kind: CatalogKind) -> Result<Arc<Catalog>, CatalogError> {
        let revision = self.inner.revision(kind).await?;

        let cached = rw_read(&self.entries, SOURCE, "load").get(&kind).cloned();
        if let Some(entry) = cached.filter(|entry| entry.revision == revision) {
            counter!(CATALOG_CACHE_HIT_TOTAL, "catalog" => kind.as_str()).increment(1);
            return Ok(entry.catalog);
        }

        counter!(CATALOG_CACHE_MISS_TOTAL, "catalog" => kind.as_str()).increment(1);
        let catalog = self.inner.load(kind).await?;
        rw_write(&self.entries, SOURCE, "load").insert(
            kind,
            CachedEntry {
                revision,
                catalog: Arc::clone(&catalog),
            },
        );

        debug!(
            target = SOURCE,
            op = "load",
            catalog = %kind,
            entries = catalog.len(),
            result = "refreshed",
            "Catalog cache refreshed"
        );

        Ok(catalog)
    }

    async fn revision(&self, kind: CatalogKind) -> Result<Option<SystemTime>, CatalogError> {
        self.inner.revision(kind).await
    }

    fn invalidate(&self, kind: Option<CatalogKind>) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
        match kind {
            Some(kind) => {
                entries.remove(&kind);
            }
            None => entries.clear(),
        }
        self.inner.invalidate(kind);

        debug!(
            target = SOURCE,
            op = "invalidate",
            catalog = kind.map(CatalogKind::as_str).unwrap_or("all"),
            "Catalog cache invalidated"
        );
    }
}
