//! Wiring of services and router state from resolved settings.

use std::sync::Arc;

use crate::{
    application::{
        artifacts::ArtifactResolver,
        catalog::CatalogService,
        error::AppError,
        generation::GenerationService,
        render::{RenderCommand, RenderInvoker, RenderPool},
        repos::CatalogRepo,
    },
    config::Settings,
    infra::{
        assets::{AssetDir, CATALOG_CACHE_CONTROL, OUTPUT_CACHE_CONTROL},
        catalog::{CachedCatalog, FileCatalog},
        error::InfraError,
        http::{AdminState, HttpState},
        staging::StagingStore,
    },
};

pub struct ApplicationContext {
    pub http_state: HttpState,
    pub admin_state: AdminState,
}

pub fn build_application_context(settings: &Settings) -> Result<ApplicationContext, AppError> {
    let files = FileCatalog::new(
        settings.catalog.slides_path.clone(),
        settings.catalog.infographics_path.clone(),
    );
    let catalog_repo: Arc<dyn CatalogRepo> = if settings.catalog.cache {
        Arc::new(CachedCatalog::new(files))
    } else {
        Arc::new(files)
    };

    let resolver = ArtifactResolver::new(settings.server.public_base_url.clone());
    let catalog = CatalogService::new(catalog_repo, resolver.clone());

    let staging = Arc::new(
        StagingStore::new(
            settings.staging.config_dir.clone(),
            settings.staging.output_dir.clone(),
        )
        .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let concurrency = usize::try_from(settings.render.concurrency.get())
        .map_err(|_| AppError::unexpected("render.concurrency exceeds usize"))?;
    let queue_depth = usize::try_from(settings.render.queue_depth)
        .map_err(|_| AppError::unexpected("render.queue_depth exceeds usize"))?;

    let generation = GenerationService::new(
        Arc::clone(&staging),
        RenderInvoker::new(RenderCommand::from_settings(&settings.render)),
        RenderPool::new(concurrency, queue_depth),
        resolver,
        settings.render.verify_outputs,
    );

    let max_body_bytes = usize::try_from(settings.server.max_body_bytes.get())
        .map_err(|_| AppError::unexpected("server.max_body_bytes exceeds usize"))?;

    let http_state = HttpState {
        catalog: catalog.clone(),
        generation,
        slides_assets: AssetDir::new(
            settings.catalog.slides_assets.clone(),
            CATALOG_CACHE_CONTROL,
        ),
        infographics_assets: AssetDir::new(
            settings.catalog.infographics_assets.clone(),
            CATALOG_CACHE_CONTROL,
        ),
        outputs: AssetDir::new(staging.output_root().to_path_buf(), OUTPUT_CACHE_CONTROL),
        max_body_bytes,
    };

    Ok(ApplicationContext {
        http_state,
        admin_state: AdminState { catalog },
    })
}
