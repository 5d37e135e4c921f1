#![allow(dead_code)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode},
};
use layoutgen::{
    config::{RenderOverrides, ServeOverrides, Settings},
    infra::{bootstrap::build_application_context, http},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SLIDE_CHECKPOINT: &str = "ckpt-slide";
pub const INFOGRAPHIC_CHECKPOINT: &str = "ckpt-infographic";

/// Renderer that logs its arguments, then writes a 1x1 PNG image and overlay
/// for every document index found in the staged config.
pub const WRITING_RENDERER: &str = r#"
config=""
out=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --config) shift; config="$1" ;;
    --output_dir) shift; out="$1" ;;
  esac
  shift
done
for index in $(grep -o '"index": *"[^"]*"' "$config" | sed 's/.*"\([^"]*\)"$/\1/'); do
  printf '\211PNG\r\n\032\n\000\000\000\rIHDR\000\000\000\001\000\000\000\001\010\006\000\000\000\037\025\304\211' > "$out/$index.png"
  printf '\211PNG\r\n\032\n\000\000\000\rIHDR\000\000\000\001\000\000\000\001\010\006\000\000\000\037\025\304\211' > "$out/${index}_bbox.png"
done
echo "rendered"
"#;

pub struct Harness {
    pub dir: TempDir,
    pub public: Router,
    pub admin: Router,
}

impl Harness {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn args_log(&self) -> PathBuf {
        self.path("renderer-args.log")
    }

    pub fn renderer_args(&self) -> Option<String> {
        std::fs::read_to_string(self.args_log()).ok()
    }
}

/// Build both routers over a temporary workspace. `renderer_body` becomes the
/// body of the renderer shell script; every invocation first appends its
/// arguments to `renderer-args.log`.
pub fn harness(renderer_body: &str, customize: impl FnOnce(&mut ServeOverrides)) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();

    std::fs::create_dir_all(root.join("meta")).expect("meta dir");
    write_json(
        &root.join("meta/slides.json"),
        json!([
            { "index": "3_1", "full_image_caption": "intro", "layers_all": [] },
            { "index": "3_2", "full_image_caption": "body", "layers_all": [] },
            { "index": "3_3", "full_image_caption": "outro", "layers_all": [] }
        ]),
    );
    write_json(
        &root.join("meta/infographics.json"),
        json!([{ "index": 17, "full_image_caption": "timeline", "layers_all": [] }]),
    );

    std::fs::create_dir_all(root.join("slides")).expect("slides dir");
    std::fs::write(root.join("slides/3_1.png"), b"\x89PNG\r\n\x1a\n").expect("slide image");
    std::fs::create_dir_all(root.join("infographics")).expect("infographics dir");

    let args_log = root.join("renderer-args.log");
    let program = root.join("renderer");
    std::fs::write(
        &program,
        format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\n{renderer_body}",
            args_log.display()
        ),
    )
    .expect("write renderer");
    let mut perms = std::fs::metadata(&program).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&program, perms).expect("set perms");

    let mut overrides = ServeOverrides {
        render: RenderOverrides {
            program: Some(program),
            script: Some(PathBuf::new()),
            slide_checkpoint: Some(SLIDE_CHECKPOINT.to_string()),
            infographic_checkpoint: Some(INFOGRAPHIC_CHECKPOINT.to_string()),
            timeout_seconds: Some(30),
            concurrency: Some(4),
            queue_depth: Some(64),
            ..Default::default()
        },
        catalog_slides_path: Some(root.join("meta/slides.json")),
        catalog_infographics_path: Some(root.join("meta/infographics.json")),
        catalog_slides_assets: Some(root.join("slides")),
        catalog_infographics_assets: Some(root.join("infographics")),
        staging_config_dir: Some(root.join("tmp")),
        staging_output_dir: Some(root.join("outputs")),
        ..Default::default()
    };
    customize(&mut overrides);

    let settings = Settings::from_overrides(&overrides).expect("valid settings");
    let app = build_application_context(&settings).expect("application context");

    Harness {
        dir,
        public: http::build_router(app.http_state),
        admin: http::build_admin_router(app.admin_state),
    }
}

pub fn write_json(path: &Path, value: Value) {
    std::fs::write(path, serde_json::to_vec_pretty(&value).expect("json")).expect("write json");
}

pub fn layout_request(index: &str, top_left: [i64; 2], bottom_right: [i64; 2]) -> Value {
    json!([{
        "index": index,
        "full_image_caption": "A bold title over a soft gradient",
        "layers_all": [
            {
                "category": "base",
                "top_left": top_left,
                "bottom_right": bottom_right,
                "caption": "gradient background",
                "active": true
            },
            {
                "category": "text",
                "top_left": [120, 80],
                "bottom_right": [900, 200],
                "caption": "headline",
                "text": "Quarterly results",
                "active": false
            }
        ]
    }])
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Vec<u8>>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .expect("request should build");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(router, Method::GET, uri, None).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(body).expect("json body");
    let response = send(router, Method::POST, uri, Some(bytes)).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

/// Path component of an absolute URL returned by the API.
pub fn url_path(url: &str) -> String {
    url.strip_prefix("http://localhost:3000")
        .unwrap_or(url)
        .to_string()
}
