use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the layoutgen binary.
#[derive(Debug, Parser)]
#[command(
    name = "layoutgen",
    version,
    about = "Slide and infographic generation server"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LAYOUTGEN_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public and administrative HTTP listeners.
    Serve(Box<ServeArgs>),
    /// Validate and classify a generation request file without rendering it.
    Check(CheckArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    /// JSON file holding an array of layout documents.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the renderer executable.
    #[arg(long = "render-program", value_name = "PATH")]
    pub program: Option<PathBuf>,

    /// Override the script passed as the renderer's first argument.
    #[arg(long = "render-script", value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Override the checkpoint used for slide documents.
    #[arg(long = "render-slide-checkpoint", value_name = "ID")]
    pub slide_checkpoint: Option<String>,

    /// Override the checkpoint used for infographic documents.
    #[arg(long = "render-infographic-checkpoint", value_name = "ID")]
    pub infographic_checkpoint: Option<String>,

    /// Override the per-render timeout.
    #[arg(long = "render-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the number of renders allowed to run at once.
    #[arg(long = "render-concurrency", value_name = "COUNT")]
    pub concurrency: Option<u32>,

    /// Override the number of requests allowed to wait for a render slot.
    #[arg(long = "render-queue-depth", value_name = "COUNT")]
    pub queue_depth: Option<u32>,

    /// Toggle verification of rendered artifacts.
    #[arg(
        long = "render-verify-outputs",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub verify_outputs: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub render: RenderOverrides,

    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the base URL used when building links in responses.
    #[arg(long = "server-public-base-url", value_name = "URL")]
    pub public_base_url: Option<String>,

    /// Override the maximum accepted request body size in bytes.
    #[arg(long = "server-max-body-bytes", value_name = "BYTES")]
    pub max_body_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the slide catalog file.
    #[arg(long = "catalog-slides-path", value_name = "PATH")]
    pub catalog_slides_path: Option<PathBuf>,

    /// Override the infographic catalog file.
    #[arg(long = "catalog-infographics-path", value_name = "PATH")]
    pub catalog_infographics_path: Option<PathBuf>,

    /// Override the directory served under `/slides`.
    #[arg(long = "catalog-slides-assets", value_name = "PATH")]
    pub catalog_slides_assets: Option<PathBuf>,

    /// Override the directory served under `/infographics`.
    #[arg(long = "catalog-infographics-assets", value_name = "PATH")]
    pub catalog_infographics_assets: Option<PathBuf>,

    /// Toggle the read-through catalog cache.
    #[arg(
        long = "catalog-cache",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub catalog_cache: Option<bool>,

    /// Override the directory holding staged request configs.
    #[arg(long = "staging-config-dir", value_name = "PATH")]
    pub staging_config_dir: Option<PathBuf>,

    /// Override the directory holding per-request render outputs.
    #[arg(long = "staging-output-dir", value_name = "PATH")]
    pub staging_output_dir: Option<PathBuf>,
}
