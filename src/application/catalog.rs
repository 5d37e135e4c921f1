//! Read-side service over the slide and infographic catalogs.

use std::sync::Arc;

use layoutgen_api_types::{CatalogListItem, InfographicDetail, SlideDetail};
use thiserror::Error;

use crate::{
    application::{
        artifacts::ArtifactResolver,
        repos::{Catalog, CatalogError, CatalogRepo},
    },
    domain::catalog::{CatalogKind, SlideKey},
};

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("{kind} entry `{index}` not found")]
    NotFound { kind: CatalogKind, index: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Navigation capability of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjacency {
    /// The catalog has no ordering between entries.
    Unsupported,
    Neighbours {
        next: Option<String>,
        previous: Option<String>,
    },
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
    resolver: ArtifactResolver,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>, resolver: ArtifactResolver) -> Self {
        Self { repo, resolver }
    }

    pub async fn list(
        &self,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogListItem>, CatalogServiceError> {
        let catalog = self.repo.load(kind).await?;
        Ok(catalog
            .entries()
            .iter()
            .map(|entry| {
                let urls = self.resolver.catalog_urls(kind, &entry.index);
                CatalogListItem {
                    index: entry.index.clone(),
                    slide_url: urls.image_url,
                    bbox_url: urls.bbox_url,
                }
            })
            .collect())
    }

    pub async fn slide_detail(&self, index: &str) -> Result<SlideDetail, CatalogServiceError> {
        let kind = CatalogKind::Slides;
        let catalog = self.repo.load(kind).await?;
        let entry = catalog
            .get(index)
            .ok_or_else(|| not_found(kind, index))?;

        let (next_slide_url, previous_slide_url) = match self.adjacency(kind, &catalog, index) {
            Adjacency::Neighbours { next, previous } => (next, previous),
            Adjacency::Unsupported => (None, None),
        };

        Ok(SlideDetail {
            index: entry.index.clone(),
            index_json: entry.document.clone(),
            next_slide_url,
            previous_slide_url,
        })
    }

    pub async fn infographic_detail(
        &self,
        index: &str,
    ) -> Result<InfographicDetail, CatalogServiceError> {
        let kind = CatalogKind::Infographics;
        let catalog = self.repo.load(kind).await?;
        let entry = catalog
            .get(index)
            .ok_or_else(|| not_found(kind, index))?;

        Ok(InfographicDetail {
            index: entry.index.clone(),
            index_json: entry.document.clone(),
        })
    }

    /// Neighbouring entries within a slide group. A key that does not parse as
    /// `<group>_<ordinal>` has no neighbours.
    pub fn adjacency(&self, kind: CatalogKind, catalog: &Catalog, index: &str) -> Adjacency {
        if !kind.supports_adjacency() {
            return Adjacency::Unsupported;
        }

        let Some(key) = SlideKey::parse(index) else {
            return Adjacency::Neighbours {
                next: None,
                previous: None,
            };
        };

        let link = |candidate: Option<SlideKey>| {
            candidate
                .map(|key| key.to_string())
                .filter(|key| catalog.contains(key))
                .map(|key| self.resolver.detail_url(kind, &key))
        };

        Adjacency::Neighbours {
            next: link(key.next()),
            previous: link(key.previous()),
        }
    }

    pub fn invalidate(&self, kind: Option<CatalogKind>) {
        self.repo.invalidate(kind);
    }
}

fn not_found(kind: CatalogKind, index: &str) -> CatalogServiceError {
    CatalogServiceError::NotFound {
        kind,
        index: index.to_string(),
    }
}
