//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CheckArgs, CliArgs, Command, RenderOverrides, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "layoutgen";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_SLIDES_CATALOG: &str = "meta/slides.json";
const DEFAULT_INFOGRAPHICS_CATALOG: &str = "meta/infographics.json";
const DEFAULT_SLIDES_ASSETS: &str = "slides";
const DEFAULT_INFOGRAPHICS_ASSETS: &str = "infographics";
const DEFAULT_STAGING_CONFIG_DIR: &str = "tmp";
const DEFAULT_STAGING_OUTPUT_DIR: &str = "outputs";
const DEFAULT_RENDER_PROGRAM: &str = "python";
const DEFAULT_RENDER_SCRIPT: &str = "inference.py";
const DEFAULT_CHECKPOINT_FLAG: &str = "--checkpoint";
const DEFAULT_SLIDE_CHECKPOINT: &str = "checkpoints/slides";
const DEFAULT_INFOGRAPHIC_CHECKPOINT: &str = "checkpoints/infographics";
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 900;
const DEFAULT_RENDER_CONCURRENCY: u32 = 1;
const DEFAULT_RENDER_QUEUE_DEPTH: u32 = 8;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub catalog: CatalogSettings,
    pub staging: StagingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub public_base_url: Url,
    pub max_body_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub slides_path: PathBuf,
    pub infographics_path: PathBuf,
    pub slides_assets: PathBuf,
    pub infographics_assets: PathBuf,
    pub cache: bool,
}

#[derive(Debug, Clone)]
pub struct StagingSettings {
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub program: PathBuf,
    pub script: Option<PathBuf>,
    pub checkpoint_flag: String,
    pub slide_checkpoint: String,
    pub infographic_checkpoint: String,
    pub timeout: Duration,
    pub concurrency: NonZeroU32,
    pub queue_depth: u32,
    pub verify_outputs: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("LAYOUTGEN").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Check(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

impl Settings {
    /// Resolve settings from built-in defaults plus explicit overrides, ignoring
    /// configuration files and the environment.
    pub fn from_overrides(overrides: &ServeOverrides) -> Result<Self, LoadError> {
        let mut raw = RawSettings::default();
        raw.apply_serve_overrides(overrides);
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            catalog,
            staging,
            render,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            catalog: build_catalog_settings(catalog)?,
            staging: build_staging_settings(staging)?,
            render: build_render_settings(render)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    catalog: RawCatalogSettings,
    staging: RawStagingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(url) = overrides.public_base_url.as_ref() {
            self.server.public_base_url = Some(url.clone());
        }
        if let Some(limit) = overrides.max_body_bytes {
            self.server.max_body_bytes = Some(limit);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.catalog_slides_path.as_ref() {
            self.catalog.slides_path = Some(path.clone());
        }
        if let Some(path) = overrides.catalog_infographics_path.as_ref() {
            self.catalog.infographics_path = Some(path.clone());
        }
        if let Some(dir) = overrides.catalog_slides_assets.as_ref() {
            self.catalog.slides_assets = Some(dir.clone());
        }
        if let Some(dir) = overrides.catalog_infographics_assets.as_ref() {
            self.catalog.infographics_assets = Some(dir.clone());
        }
        if let Some(cache) = overrides.catalog_cache {
            self.catalog.cache = Some(cache);
        }
        if let Some(dir) = overrides.staging_config_dir.as_ref() {
            self.staging.config_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.staging_output_dir.as_ref() {
            self.staging.output_dir = Some(dir.clone());
        }

        self.apply_render_overrides(&overrides.render);
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(program) = overrides.program.as_ref() {
            self.render.program = Some(program.clone());
        }
        if let Some(script) = overrides.script.as_ref() {
            self.render.script = Some(script.clone());
        }
        if let Some(checkpoint) = overrides.slide_checkpoint.as_ref() {
            self.render.slide_checkpoint = Some(checkpoint.clone());
        }
        if let Some(checkpoint) = overrides.infographic_checkpoint.as_ref() {
            self.render.infographic_checkpoint = Some(checkpoint.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.render.timeout_seconds = Some(seconds);
        }
        if let Some(value) = overrides.concurrency {
            self.render.concurrency = Some(value);
        }
        if let Some(value) = overrides.queue_depth {
            self.render.queue_depth = Some(value);
        }
        if let Some(verify) = overrides.verify_outputs {
            self.render.verify_outputs = Some(verify);
        }
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    let base = server
        .public_base_url
        .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());
    let public_base_url = Url::parse(base.trim())
        .map_err(|err| LoadError::invalid("server.public_base_url", format!("{err}")))?;
    if !matches!(public_base_url.scheme(), "http" | "https") || public_base_url.cannot_be_a_base()
    {
        return Err(LoadError::invalid(
            "server.public_base_url",
            "must be an absolute http(s) URL",
        ));
    }

    let max_body_bytes_value = server.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
    let max_body_bytes = NonZeroU64::new(max_body_bytes_value).ok_or_else(|| {
        LoadError::invalid("server.max_body_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_body_bytes_value).map_err(|_| {
        LoadError::invalid(
            "server.max_body_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        public_base_url,
        max_body_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> Result<CatalogSettings, LoadError> {
    Ok(CatalogSettings {
        slides_path: non_empty_path(
            catalog.slides_path,
            DEFAULT_SLIDES_CATALOG,
            "catalog.slides_path",
        )?,
        infographics_path: non_empty_path(
            catalog.infographics_path,
            DEFAULT_INFOGRAPHICS_CATALOG,
            "catalog.infographics_path",
        )?,
        slides_assets: non_empty_path(
            catalog.slides_assets,
            DEFAULT_SLIDES_ASSETS,
            "catalog.slides_assets",
        )?,
        infographics_assets: non_empty_path(
            catalog.infographics_assets,
            DEFAULT_INFOGRAPHICS_ASSETS,
            "catalog.infographics_assets",
        )?,
        cache: catalog.cache.unwrap_or(false),
    })
}

fn build_staging_settings(staging: RawStagingSettings) -> Result<StagingSettings, LoadError> {
    let config_dir = non_empty_path(
        staging.config_dir,
        DEFAULT_STAGING_CONFIG_DIR,
        "staging.config_dir",
    )?;
    let output_dir = non_empty_path(
        staging.output_dir,
        DEFAULT_STAGING_OUTPUT_DIR,
        "staging.output_dir",
    )?;
    if config_dir == output_dir {
        return Err(LoadError::invalid(
            "staging.output_dir",
            "must differ from staging.config_dir",
        ));
    }

    Ok(StagingSettings {
        config_dir,
        output_dir,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let program = non_empty_path(render.program, DEFAULT_RENDER_PROGRAM, "render.program")?;

    // An explicitly empty script runs the program without a leading argument.
    let script = match render.script {
        Some(path) if path.as_os_str().is_empty() => None,
        Some(path) => Some(path),
        None => Some(PathBuf::from(DEFAULT_RENDER_SCRIPT)),
    };

    let checkpoint_flag = non_empty_string(
        render.checkpoint_flag,
        DEFAULT_CHECKPOINT_FLAG,
        "render.checkpoint_flag",
    )?;
    let slide_checkpoint = non_empty_string(
        render.slide_checkpoint,
        DEFAULT_SLIDE_CHECKPOINT,
        "render.slide_checkpoint",
    )?;
    let infographic_checkpoint = non_empty_string(
        render.infographic_checkpoint,
        DEFAULT_INFOGRAPHIC_CHECKPOINT,
        "render.infographic_checkpoint",
    )?;
    if slide_checkpoint == infographic_checkpoint {
        return Err(LoadError::invalid(
            "render.infographic_checkpoint",
            "must differ from render.slide_checkpoint",
        ));
    }

    let timeout_seconds = render
        .timeout_seconds
        .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "render.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let concurrency = non_zero_u32(
        render
            .concurrency
            .unwrap_or(DEFAULT_RENDER_CONCURRENCY)
            .into(),
        "render.concurrency",
    )?;

    Ok(RenderSettings {
        program,
        script,
        checkpoint_flag,
        slide_checkpoint,
        infographic_checkpoint,
        timeout: Duration::from_secs(timeout_seconds),
        concurrency,
        queue_depth: render.queue_depth.unwrap_or(DEFAULT_RENDER_QUEUE_DEPTH),
        verify_outputs: render.verify_outputs.unwrap_or(true),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    public_base_url: Option<String>,
    max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    slides_path: Option<PathBuf>,
    infographics_path: Option<PathBuf>,
    slides_assets: Option<PathBuf>,
    infographics_assets: Option<PathBuf>,
    cache: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStagingSettings {
    config_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    program: Option<PathBuf>,
    script: Option<PathBuf>,
    checkpoint_flag: Option<String>,
    slide_checkpoint: Option<String>,
    infographic_checkpoint: Option<String>,
    timeout_seconds: Option<u64>,
    concurrency: Option<u32>,
    queue_depth: Option<u32>,
    verify_outputs: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_empty_path(
    value: Option<PathBuf>,
    default: &str,
    key: &'static str,
) -> Result<PathBuf, LoadError> {
    let path = value.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(path)
}

fn non_empty_string(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests;
