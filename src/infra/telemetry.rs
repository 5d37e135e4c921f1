use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const RENDER_STARTED_TOTAL: &str = "layoutgen_render_started_total";
pub const RENDER_SUCCEEDED_TOTAL: &str = "layoutgen_render_succeeded_total";
pub const RENDER_FAILED_TOTAL: &str = "layoutgen_render_failed_total";
pub const RENDER_REJECTED_TOTAL: &str = "layoutgen_render_rejected_total";
pub const RENDER_IN_FLIGHT: &str = "layoutgen_render_in_flight";
pub const RENDER_DURATION_MS: &str = "layoutgen_render_ms";
pub const CATALOG_CACHE_HIT_TOTAL: &str = "layoutgen_catalog_cache_hit_total";
pub const CATALOG_CACHE_MISS_TOTAL: &str = "layoutgen_catalog_cache_miss_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            RENDER_STARTED_TOTAL,
            Unit::Count,
            "Total number of renderer processes started."
        );
        describe_counter!(
            RENDER_SUCCEEDED_TOTAL,
            Unit::Count,
            "Total number of renders that exited cleanly and passed verification."
        );
        describe_counter!(
            RENDER_FAILED_TOTAL,
            Unit::Count,
            "Total number of renders that failed, labelled by reason."
        );
        describe_counter!(
            RENDER_REJECTED_TOTAL,
            Unit::Count,
            "Total number of generation requests rejected because the render pool was full."
        );
        describe_gauge!(
            RENDER_IN_FLIGHT,
            Unit::Count,
            "Current number of admitted generation requests (running or waiting)."
        );
        describe_histogram!(
            RENDER_DURATION_MS,
            Unit::Milliseconds,
            "Renderer process wall time in milliseconds."
        );
        describe_counter!(
            CATALOG_CACHE_HIT_TOTAL,
            Unit::Count,
            "Total number of catalog reads served from the cache."
        );
        describe_counter!(
            CATALOG_CACHE_MISS_TOTAL,
            Unit::Count,
            "Total number of catalog reads that went to disk."
        );
    });
}
