#![cfg(unix)]

mod common;

use std::collections::HashSet;

use axum::http::StatusCode;
use common::{WRITING_RENDERER, get_json, harness, layout_request, post_json};
use layoutgen::{
    application::render::RenderPool,
    infra::telemetry::{
        CATALOG_CACHE_HIT_TOTAL, CATALOG_CACHE_MISS_TOTAL, RENDER_DURATION_MS, RENDER_FAILED_TOTAL,
        RENDER_IN_FLIGHT, RENDER_REJECTED_TOTAL, RENDER_STARTED_TOTAL, RENDER_SUCCEEDED_TOTAL,
    },
};
use metrics_util::debugging::DebuggingRecorder;

#[tokio::test]
async fn render_and_catalog_metrics_are_recorded() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("install debugging recorder");

    let harness = harness(WRITING_RENDERER, |overrides| {
        overrides.catalog_cache = Some(true);
    });

    let (status, _) = get_json(&harness.public, "/api/slides").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(&harness.public, "/api/slides").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &harness.public,
        "/api/generate",
        &layout_request("3_2", [0, 0], [1536, 864]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let failing = common::harness("exit 9\n", |_| {});
    let (status, _) = post_json(
        &failing.public,
        "/api/generate",
        &layout_request("3_2", [0, 0], [1536, 864]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let pool = RenderPool::new(1, 0);
    let _held = pool.try_admit().expect("first admission");
    assert!(pool.try_admit().is_err());

    let names = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect::<HashSet<_>>();

    for expected in [
        CATALOG_CACHE_MISS_TOTAL,
        CATALOG_CACHE_HIT_TOTAL,
        RENDER_STARTED_TOTAL,
        RENDER_SUCCEEDED_TOTAL,
        RENDER_FAILED_TOTAL,
        RENDER_REJECTED_TOTAL,
        RENDER_IN_FLIGHT,
        RENDER_DURATION_MS,
    ] {
        assert!(names.contains(expected), "missing metric {expected}: {names:?}");
    }
}
