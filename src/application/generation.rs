//! The generation pipeline: validate, classify, stage, render, verify.

use std::{sync::Arc, time::Instant};

use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        artifacts::{ArtifactResolver, ArtifactUrls},
        render::{RenderError, RenderInvoker, RenderPool, verify_outputs},
    },
    domain::{
        error::{DomainError, prepare},
        layout::{ClassificationError, GenerationCategory},
        validation::ValidationError,
    },
    infra::{
        staging::{RequestId, StagingError, StagingStore},
        telemetry::{RENDER_FAILED_TOTAL, RENDER_SUCCEEDED_TOTAL},
    },
};

const SOURCE: &str = "application::generation";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error("failed to stage generation request")]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<DomainError> for GenerationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(err) => Self::Validation(err),
            DomainError::Classification(err) => Self::Classification(err),
        }
    }
}

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub request_id: RequestId,
    pub category: GenerationCategory,
    pub index: String,
    pub urls: ArtifactUrls,
}

#[derive(Clone)]
pub struct GenerationService {
    staging: Arc<StagingStore>,
    invoker: RenderInvoker,
    pool: RenderPool,
    resolver: ArtifactResolver,
    verify: bool,
}

impl GenerationService {
    pub fn new(
        staging: Arc<StagingStore>,
        invoker: RenderInvoker,
        pool: RenderPool,
        resolver: ArtifactResolver,
        verify: bool,
    ) -> Self {
        Self {
            staging,
            invoker,
            pool,
            resolver,
            verify,
        }
    }

    /// Run the whole pipeline for a raw request body. Nothing touches the
    /// filesystem until the body validates, classifies and is admitted.
    pub async fn generate(&self, body: &Value) -> Result<GenerationOutcome, GenerationError> {
        let started_at = Instant::now();
        let batch = prepare(body)?;
        let admission = self.pool.try_admit()?;

        let staged = self.staging.stage(&batch.documents).await?;
        let _slot = admission.acquire().await?;

        self.invoker
            .invoke(&staged.config_path, &staged.output_dir, batch.category)
            .await?;

        if self.verify {
            let indexes: Vec<String> =
                batch.documents.iter().map(|doc| doc.index.clone()).collect();
            if let Err(err) = verify_outputs(&staged.output_dir, &indexes).await {
                warn!(
                    target = SOURCE,
                    op = "generate",
                    result = "error",
                    error_code = err.code(),
                    request_id = %staged.id,
                    error = %err,
                    "Renderer exited cleanly but outputs are incomplete"
                );
                counter!(RENDER_FAILED_TOTAL, "reason" => "missing_artifact").increment(1);
                return Err(err.into());
            }
        }

        let index = batch.primary_index().to_string();
        let urls = self.resolver.output_urls(staged.id, &index);
        counter!(RENDER_SUCCEEDED_TOTAL, "category" => batch.category.as_str()).increment(1);
        info!(
            target = SOURCE,
            op = "generate",
            result = "ok",
            request_id = %staged.id,
            category = batch.category.as_str(),
            documents = batch.documents.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Generation finished"
        );

        Ok(GenerationOutcome {
            request_id: staged.id,
            category: batch.category,
            index,
            urls,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{
        os::unix::fs::PermissionsExt,
        path::{Path, PathBuf},
        time::Duration,
    };

    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;

    use super::*;
    use crate::application::render::RenderCommand;

    const PNG_1X1: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00\x1f\x15\xc4\x89";

    fn renderer(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("renderer");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("set perms");
        path
    }

    fn service(dir: &TempDir, program: PathBuf, verify: bool) -> GenerationService {
        let staging =
            StagingStore::new(dir.path().join("tmp"), dir.path().join("outputs")).expect("store");
        GenerationService::new(
            Arc::new(staging),
            RenderInvoker::new(RenderCommand {
                program,
                script: None,
                checkpoint_flag: "--checkpoint".into(),
                slide_checkpoint: "slide-ckpt".into(),
                infographic_checkpoint: "infographic-ckpt".into(),
                timeout: Duration::from_secs(10),
            }),
            RenderPool::new(1, 4),
            ArtifactResolver::new(Url::parse("http://localhost:3000").expect("url")),
            verify,
        )
    }

    fn request(index: &str) -> Value {
        json!([{
            "index": index,
            "full_image_caption": "a title slide",
            "layers_all": [{
                "category": "base",
                "top_left": [0, 0],
                "bottom_right": [1536, 864],
                "caption": "background"
            }]
        }])
    }

    #[tokio::test]
    async fn rejected_requests_leave_no_staged_files() {
        let dir = TempDir::new().expect("tempdir");
        let service = service(&dir, PathBuf::from("/bin/false"), false);

        let err = service
            .generate(&json!([{ "index": "x" }]))
            .await
            .expect_err("invalid body");
        assert!(matches!(err, GenerationError::Validation(_)));

        let mut no_base = request("x");
        no_base[0]["layers_all"][0]["category"] = json!("image");
        let err = service.generate(&no_base).await.expect_err("no base layer");
        assert!(matches!(err, GenerationError::Classification(_)));

        assert_eq!(std::fs::read_dir(dir.path().join("tmp")).expect("dir").count(), 0);
        assert_eq!(
            std::fs::read_dir(dir.path().join("outputs")).expect("dir").count(),
            0
        );
    }

    #[tokio::test]
    async fn clean_exit_without_outputs_fails_verification() {
        let dir = TempDir::new().expect("tempdir");
        let program = renderer(dir.path(), "exit 0\n");

        let err = service(&dir, program.clone(), true)
            .generate(&request("3_2"))
            .await
            .expect_err("missing outputs");
        assert!(matches!(
            err,
            GenerationError::Render(RenderError::MissingArtifact { .. })
        ));

        let outcome = service(&dir, program, false)
            .generate(&request("3_2"))
            .await
            .expect("verification disabled");
        assert_eq!(outcome.index, "3_2");
        let expected = format!("/outputs/{}/3_2.png", outcome.request_id);
        assert!(outcome.urls.image_url.ends_with(&expected));
    }

    fn assert_send_static<F: std::future::Future + Send + 'static>(_: F) {}

    #[test]
    fn generate_future_can_back_an_http_handler() {
        let dir = TempDir::new().expect("tempdir");
        let service = service(&dir, PathBuf::from("/bin/true"), true);
        assert_send_static(async move { service.generate(&request("3_2")).await });
    }

    #[tokio::test]
    async fn every_document_in_a_batch_is_verified() {
        let dir = TempDir::new().expect("tempdir");
        let fixture = dir.path().join("fixture.png");
        std::fs::write(&fixture, PNG_1X1).expect("write fixture");
        let program = renderer(
            dir.path(),
            &format!(
                "while [ \"$#\" -gt 0 ]; do [ \"$1\" = --output_dir ] && out=\"$2\"; shift; done\n\
                 cp \"{0}\" \"$out/a.png\"\ncp \"{0}\" \"$out/a_bbox.png\"\n",
                fixture.display()
            ),
        );
        let mut body = request("a");
        let mut second = body[0].clone();
        second["index"] = json!("b");
        body.as_array_mut().expect("array").push(second);

        let err = service(&dir, program, true)
            .generate(&body)
            .await
            .expect_err("second document has no outputs");
        assert!(matches!(
            err,
            GenerationError::Render(RenderError::MissingArtifact { ref path, .. })
                if path.ends_with("b.png")
        ));
    }
}
