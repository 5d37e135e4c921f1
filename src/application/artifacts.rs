//! Public URLs for catalog assets and generated outputs.

use url::Url;

use crate::{domain::catalog::CatalogKind, infra::staging::RequestId};

/// Mount under which per-request render outputs are served.
pub const OUTPUTS_MOUNT: &str = "outputs";

pub fn image_file_name(index: &str) -> String {
    format!("{index}.png")
}

pub fn bbox_file_name(index: &str) -> String {
    format!("{index}_bbox.png")
}

/// URL pair describing one rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUrls {
    pub image_url: String,
    pub bbox_url: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    base: Url,
}

impl ArtifactResolver {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Static catalog image and overlay, e.g. `/slides/3_2.png`.
    pub fn catalog_urls(&self, kind: CatalogKind, index: &str) -> ArtifactUrls {
        ArtifactUrls {
            image_url: self.join(&[kind.as_str(), &image_file_name(index)]),
            bbox_url: self.join(&[kind.as_str(), &bbox_file_name(index)]),
        }
    }

    /// Generated image and overlay of one staged request.
    pub fn output_urls(&self, request: RequestId, index: &str) -> ArtifactUrls {
        let request = request.to_string();
        ArtifactUrls {
            image_url: self.join(&[OUTPUTS_MOUNT, &request, &image_file_name(index)]),
            bbox_url: self.join(&[OUTPUTS_MOUNT, &request, &bbox_file_name(index)]),
        }
    }

    /// API detail URL of a catalog entry.
    pub fn detail_url(&self, kind: CatalogKind, index: &str) -> String {
        self.join(&["api", kind.as_str(), index])
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }
}
