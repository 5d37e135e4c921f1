//! Disk-backed static asset serving for catalog images and render outputs.

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;
use tokio::fs;
use tracing::error;

use crate::application::error::ErrorReport;

pub const CATALOG_CACHE_CONTROL: &str = "public, max-age=300";
pub const OUTPUT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// A directory exposed read-only under one URL mount.
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
    cache_control: &'static str,
}

impl AssetDir {
    pub fn new(root: PathBuf, cache_control: &'static str) -> Self {
        Self {
            root,
            cache_control,
        }
    }

    /// Map a request path onto the root. Absolute paths, traversal and
    /// directory requests resolve to nothing.
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let candidate = requested.trim_start_matches('/');
        if candidate.is_empty() || candidate.ends_with('/') {
            return None;
        }

        let relative = Path::new(candidate);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }

    pub async fn serve(&self, requested: &str, source: &'static str) -> Response {
        let Some(path) = self.resolve(requested) else {
            return not_found_response(source);
        };

        match fs::read(&path).await {
            Ok(bytes) => {
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                build_response(Bytes::from(bytes), mime, self.cache_control)
            }
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                not_found_response(source)
            }
            Err(err) => {
                error!(
                    target = source,
                    path = %path.display(),
                    error = %err,
                    "failed to read static asset"
                );
                let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
                ErrorReport::from_error(source, StatusCode::INTERNAL_SERVER_ERROR, &err)
                    .attach(&mut response);
                response
            }
        }
    }
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

fn build_response(bytes: Bytes, mime: Mime, cache_control: &'static str) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn resolve_rejects_traversal_and_directories() {
        let assets = AssetDir::new(PathBuf::from("/srv/slides"), CATALOG_CACHE_CONTROL);

        assert_eq!(
            assets.resolve("3_2.png"),
            Some(PathBuf::from("/srv/slides/3_2.png"))
        );
        assert_eq!(
            assets.resolve("/1700000000000/3_2_bbox.png"),
            Some(PathBuf::from("/srv/slides/1700000000000/3_2_bbox.png"))
        );
        assert_eq!(assets.resolve("../meta/slides.json"), None);
        assert_eq!(assets.resolve("a/../../etc/passwd"), None);
        assert_eq!(assets.resolve("./3_2.png"), None);
        assert_eq!(assets.resolve("1700000000000/"), None);
        assert_eq!(assets.resolve(""), None);
    }

    #[tokio::test]
    async fn serves_files_with_guessed_mime() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("3_2.png"), b"\x89PNG").expect("write");
        let assets = AssetDir::new(dir.path().to_path_buf(), OUTPUT_CACHE_CONTROL);

        let response = assets.serve("3_2.png", "test").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("image/png"))
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static(OUTPUT_CACHE_CONTROL))
        );

        let missing = assets.serve("9_9.png", "test").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.extensions().get::<ErrorReport>().is_some());
    }
}
