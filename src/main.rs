use std::process;

use layoutgen::{
    application::{error::AppError, render::RenderCommand},
    config,
    domain::error::{DomainError, prepare},
    infra::{bootstrap::build_application_context, error::InfraError, http, telemetry},
};
use serde_json::{Value, json};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(args) => run_check(&settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    let public_router = http::build_router(app.http_state);
    let admin_router = http::build_admin_router(app.admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "layoutgen::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        public_base_url = %settings.server.public_base_url,
        render_concurrency = settings.render.concurrency.get(),
        render_queue_depth = settings.render.queue_depth,
        catalog_cache = settings.catalog.cache,
        "listeners bound"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::from(InfraError::server(err.to_string())))?;

    info!(target = "layoutgen::serve", "shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "layoutgen::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}

async fn run_check(settings: &config::Settings, args: config::CheckArgs) -> Result<(), AppError> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;
    let body: Value = serde_json::from_slice(&bytes)
        .map_err(|err| AppError::validation(format!("malformed JSON: {err}")))?;

    let command = RenderCommand::from_settings(&settings.render);
    let report = match prepare(&body) {
        Ok(batch) => json!({
            "valid": true,
            "category": batch.category,
            "checkpoint": command.checkpoint(batch.category),
            "documents": batch
                .documents
                .iter()
                .map(|doc| doc.index.as_str())
                .collect::<Vec<_>>(),
        }),
        Err(DomainError::Validation(err)) => json!({
            "valid": false,
            "error": "Invalid config format",
            "details": err.violations,
        }),
        Err(DomainError::Classification(err)) => json!({
            "valid": false,
            "error": "Classification failed",
            "details": err.to_string(),
        }),
    };

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    println!("{rendered}");

    if report["valid"] == Value::Bool(true) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{} is not a valid generation request",
            args.file.display()
        )))
    }
}
